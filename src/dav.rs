//! The external WebDAV method façade (spec §1, §6, SPEC_FULL.md §10).
//!
//! spec.md explicitly scopes the WebDAV XML PROPFIND/PROPPATCH marshalling
//! out of this engine, describing it as "a pre-existing dependency the
//! engine *uses* via a `Handler.handle(request, response)` façade." This
//! is grounded directly on the teacher's `DavHandler::handle(req) ->
//! Response<Body>` entry point (`davhandler/mod.rs`), narrowed to just the
//! methods that need XML bodies or cross-resource semantics the raw engine
//! doesn't implement itself.

use bitflags::bitflags;

use crate::adapters::FsAdapter;
use crate::http::request::{Method, Request};
use crate::http::response::Response;

bitflags! {
    /// Which HTTP methods are DAV-specific (need the façade) vs. handled
    /// directly by the engine. Grounded on the teacher's `util::DavMethod`
    /// bitflags, narrowed to the subset this engine delegates.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DavMethodSet: u32 {
        const PROPFIND  = 0x01;
        const PROPPATCH = 0x02;
        const LOCK      = 0x04;
        const UNLOCK    = 0x08;
        const COPY      = 0x10;
        const MOVE      = 0x20;
    }
}

/// Façade for the WebDAV methods the engine does not implement itself.
///
/// Implementations are expected to read `req.body()`, write XML/status into
/// `res`, and may consult `fs` for metadata needed to build a multistatus
/// response. The engine never attempts copy+delete itself on
/// `Error::CrossDevice` (spec §9 open question) — that's squarely this
/// façade's job.
pub trait DavMethodHandler {
    /// Which delegated methods this façade actually implements, used to
    /// build the `Allow`/`DAV` headers on `OPTIONS` (teacher's
    /// `handle_options.rs` `self.allow.contains(y)` check).
    fn supported(&self) -> DavMethodSet;

    /// Handle one delegated method. Returns `false` to decline, which for
    /// `Method::Options` makes the caller fall back to its own empty-body
    /// reply (enriched with `supported()`'s `Allow`/`DAV` headers) instead
    /// of the façade's answer.
    fn handle(&self, req: &Request, res: &mut Response, fs: &dyn FsAdapter) -> bool;
}

/// No-op façade: every delegated method other than `OPTIONS` replies `501
/// Not Implemented`; `OPTIONS` is declined so the caller's own handling
/// applies. Used when the embedding host binary has not wired a real
/// WebDAV handler.
pub struct UnimplementedDav;

impl DavMethodHandler for UnimplementedDav {
    fn supported(&self) -> DavMethodSet {
        DavMethodSet::empty()
    }

    fn handle(&self, req: &Request, res: &mut Response, _fs: &dyn FsAdapter) -> bool {
        if req.method == Method::Options {
            return false;
        }
        res.set_status(501, "Not Implemented");
        res.finish_empty();
        true
    }
}

/// Build the `Allow` header value: the engine's own fixed methods plus
/// whatever the façade advertises via `supported()` (teacher's `mm` helper
/// in `handle_options.rs`, collapsed to a static per-resource-type list
/// since this engine has no per-path lock/metadata lookup to branch on).
pub fn allow_header(supported: DavMethodSet) -> String {
    let mut methods = vec!["OPTIONS", "GET", "HEAD", "PUT", "DELETE", "MKCOL"];
    if supported.contains(DavMethodSet::PROPFIND) {
        methods.push("PROPFIND");
    }
    if supported.contains(DavMethodSet::PROPPATCH) {
        methods.push("PROPPATCH");
    }
    if supported.contains(DavMethodSet::COPY) {
        methods.push("COPY");
    }
    if supported.contains(DavMethodSet::MOVE) {
        methods.push("MOVE");
    }
    if supported.contains(DavMethodSet::LOCK) {
        methods.push("LOCK");
    }
    if supported.contains(DavMethodSet::UNLOCK) {
        methods.push("UNLOCK");
    }
    methods.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_header_always_includes_engine_methods() {
        let allow = allow_header(DavMethodSet::empty());
        assert_eq!(allow, "OPTIONS,GET,HEAD,PUT,DELETE,MKCOL");
    }

    #[test]
    fn allow_header_adds_supported_dav_methods() {
        let allow = allow_header(DavMethodSet::PROPFIND | DavMethodSet::MOVE);
        assert_eq!(allow, "OPTIONS,GET,HEAD,PUT,DELETE,MKCOL,PROPFIND,MOVE");
    }
}
