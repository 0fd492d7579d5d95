//! Development preview page.
//!
//! The plugin UI is loaded by the design tool from disk, so in watch mode the
//! page is rewritten to fetch its assets from the dev server and to reload
//! itself whenever a new bundle is delivered.

use crate::host::ServerAddress;

/// Path of the server-sent events endpoint that announces new deliveries.
pub const LIVE_RELOAD_PATH: &str = "/__figpack_sse__";

/// Insert the base URL and live-reload client before `</head>`.
///
/// Pages without a `</head>` are returned unchanged.
pub fn inject_live_reload(html: &str, server: &ServerAddress) -> String {
    let origin = server.origin();
    let snippet = format!(
        r#"
    <base href="{origin}/">
    <script type="module">
      const source = new EventSource("{origin}{LIVE_RELOAD_PATH}")
      source.addEventListener("reload", () => window.location.reload())
    </script>
  </head>"#
    );
    html.replacen("</head>", &snippet, 1)
}
