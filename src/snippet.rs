//! Browser-side interception snippet.
//!
//! Pasted into a page's developer console, it wraps `fetch` and
//! `XMLHttpRequest` and keeps a log of outgoing requests in the page.

use std::fs;
use std::path::Path;

/// Default file name for `--browser-script`.
pub const DEFAULT_SCRIPT_PATH: &str = "browser_capture.js";

pub const BROWSER_SCRIPT: &str = r#"
// Browser-side request interceptor.
// Paste into the developer console of the page you want to observe.

(function() {
    const originalFetch = window.fetch;
    const originalXHROpen = XMLHttpRequest.prototype.open;
    const originalXHRSend = XMLHttpRequest.prototype.send;

    const capturedRequests = [];

    window.fetch = function(...args) {
        const url = args[0];
        const options = args[1] || {};

        console.log('fetch request:', {
            url: url,
            method: options.method || 'GET',
            headers: options.headers,
            body: options.body
        });

        capturedRequests.push({
            timestamp: new Date().toISOString(),
            type: 'fetch',
            url: url,
            method: options.method || 'GET',
            headers: options.headers,
            body: options.body
        });

        return originalFetch.apply(this, args);
    };

    XMLHttpRequest.prototype.open = function(method, url, ...args) {
        this._method = method;
        this._url = url;
        return originalXHROpen.apply(this, arguments);
    };

    XMLHttpRequest.prototype.send = function(body) {
        console.log('XHR request:', {
            method: this._method,
            url: this._url,
            body: body
        });

        capturedRequests.push({
            timestamp: new Date().toISOString(),
            type: 'xhr',
            method: this._method,
            url: this._url,
            body: body
        });

        return originalXHRSend.apply(this, arguments);
    };

    window.exportCapturedRequests = function() {
        const dataStr = JSON.stringify(capturedRequests, null, 2);
        const dataBlob = new Blob([dataStr], {type: 'application/json'});
        const url = URL.createObjectURL(dataBlob);
        const link = document.createElement('a');
        link.href = url;
        link.download = 'browser_captured_requests.json';
        link.click();
        URL.revokeObjectURL(url);
    };

    window.showCapturedRequests = function() {
        console.table(capturedRequests);
        return capturedRequests;
    };

    console.log('Request interceptor installed.');
    console.log('showCapturedRequests() lists captured requests');
    console.log('exportCapturedRequests() downloads them as JSON');
})();
"#;

/// Write [`BROWSER_SCRIPT`] to `path`, replacing any existing file.
pub fn write_browser_script(path: &Path) -> std::io::Result<()> {
    fs::write(path, BROWSER_SCRIPT)?;
    tracing::info!(path = %path.display(), "Browser script written");
    Ok(())
}
