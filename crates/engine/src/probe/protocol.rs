//! Message shapes for the dependency-probe protocol (§4.5): what a rule's
//! child `redux` invocation sends when it calls `want(path)`, marks
//! volatility, stamps stdin, or expands a depfile, and what the coordinator
//! sends back.

use serde::{Deserialize, Serialize};

/// A probe request, one per driver invocation made from inside a running
/// rule. `Depfile` carries already-parsed paths: parsing the make-style
/// depfile format itself is the CLI's job (§1 "deliberately out of scope"),
/// not the coordinator's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProbeRequest {
    Want { path: String },
    Always,
    After { duration_secs: u64 },
    /// `digest` is the hex digest of stdin, already hashed by the calling
    /// driver process — only it has the stdin handle.
    Stamp { digest: String },
    Depfile { paths: Vec<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProbeResponse {
    Digest { digest: String },
    Ack,
    Error { message: String },
}
