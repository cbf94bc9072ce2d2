//! Constants for file extensions, resolution order and builtin module names.
//!
//! Extensions follow Node.js lookup order: plain JavaScript first, then JSON
//! and native addons, then the ES module / CommonJS variants and finally the
//! TypeScript family so mixed projects still resolve.

/// File extensions whose contents are scanned for import specifiers
pub const JS_TS_EXTENSIONS: &[&str] = &[
    "js",  // JavaScript
    "mjs", // JavaScript module
    "cjs", // JavaScript CommonJS
    "jsx", // JavaScript with JSX
    "ts",  // TypeScript
    "tsx", // TypeScript with JSX
    "mts", // TypeScript module
    "cts", // TypeScript CommonJS
];

/// Extensions to try when resolving module imports (in priority order)
pub const RESOLVE_EXTENSIONS: &[&str] =
    &["js", "json", "node", "mjs", "cjs", "jsx", "ts", "tsx", "mts", "cts"];

/// Index file names to try when resolving directory imports
pub const INDEX_FILES: &[&str] = &[
    "index.js",
    "index.json",
    "index.node",
    "index.mjs",
    "index.cjs",
    "index.jsx",
    "index.ts",
    "index.tsx",
    "index.mts",
    "index.cts",
];

/// Directory searched upwards for bare specifiers
pub const NODE_MODULES: &str = "node_modules";

/// Scheme prefix that always denotes a Node.js core module (`node:fs`)
pub const NODE_SCHEME: &str = "node:";

/// Node.js core modules. Subpaths such as `fs/promises` are matched on their
/// first segment.
pub const NODE_BUILTINS: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Modules provided by the Electron host, including the legacy top-level
/// names from before everything moved under `electron`.
pub const ELECTRON_BUILTINS: &[&str] = &[
    "electron",
    "app",
    "auto-updater",
    "browser-window",
    "clipboard",
    "content-tracing",
    "crash-reporter",
    "desktop-capturer",
    "dialog",
    "global-shortcut",
    "ipc",
    "ipc-main",
    "ipc-renderer",
    "menu",
    "menu-item",
    "native-image",
    "power-monitor",
    "power-save-blocker",
    "protocol",
    "remote",
    "screen",
    "session",
    "shell",
    "tray",
    "web-contents",
    "web-frame",
];
