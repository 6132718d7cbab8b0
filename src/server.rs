//! Shared tick contract (spec §4.5, §5).
//!
//! Both server variants are driven the same way by the embedding host: one
//! call per cooperative scheduler step, no internal threads, every blocking
//! adapter call bounded by an explicit timeout. `Tickable` gives the two
//! variants (`ftp::FtpServer`, `http::HttpServer`) one call shape so a
//! future `pp_tick` entrypoint (out of scope here) doesn't need to know
//! which variant it's driving.

/// One cooperative scheduler step. `now_ms` is the host clock reading at
/// the time of the call; implementations that need elapsed time (e.g. for
/// future timeout bookkeeping) derive it from this rather than reading the
/// clock adapter themselves, so the engine stays deterministic under test.
pub trait Tickable {
    fn tick(&mut self, now_ms: u64);
}
