//! HTTP method dispatch (spec §4.4, §6, SPEC_FULL.md §10).
//!
//! Grounded on the teacher's `DavHandler::handle`/`handle2` split
//! (`davhandler/mod.rs`): translate the method token, then route to either
//! a method implemented directly against the filesystem adapter or the
//! external [`DavMethodHandler`] façade. OPTIONS/GET/HEAD/PUT/DELETE/MKCOL
//! stay in the engine since they map onto `FsAdapter` without needing XML;
//! everything else is delegated.

use crate::adapters::clock::{http_date, ClockAdapter};
use crate::adapters::fs::FsAdapter;
use crate::dav::{allow_header, DavMethodHandler};
use crate::error::Error;
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::transfer::GetTransfer;
use crate::path;

/// The result of dispatching one request: either the response is complete
/// and ready to flush, or (GET on a file) the head is written and a
/// [`GetTransfer`] remains to stream the body across subsequent ticks.
pub enum DispatchOutcome<'a> {
    Complete(Response),
    StreamGet(Response, GetTransfer<'a>),
}

pub fn dispatch<'a>(
    req: &Request,
    fs: &'a dyn FsAdapter,
    dav: &dyn DavMethodHandler,
    server_header: &str,
    clock: &dyn ClockAdapter,
) -> DispatchOutcome<'a> {
    let date = http_date(clock.now_unix());
    let mut res = Response::new(req.close_requested, server_header.to_string(), date.clone());

    match req.method {
        Method::Options => {
            if !dav.handle(req, &mut res, fs) {
                res.add_header("DAV", "1");
                res.add_header("Allow", allow_header(dav.supported()));
                res.finish_empty();
            }
            DispatchOutcome::Complete(res)
        }
        Method::Get | Method::Head => dispatch_get_head(req, fs, server_header, req.method == Method::Head, clock),
        Method::Put => {
            res = dispatch_put(req, fs, res);
            DispatchOutcome::Complete(res)
        }
        Method::Delete => {
            res = dispatch_delete(req, fs, res);
            DispatchOutcome::Complete(res)
        }
        Method::Mkcol => {
            res = dispatch_mkcol(req, fs, res);
            DispatchOutcome::Complete(res)
        }
        Method::Copy | Method::Move | Method::PropFind | Method::PropPatch | Method::Other => {
            dav.handle(req, &mut res, fs);
            DispatchOutcome::Complete(res)
        }
    }
}

fn resolve(req: &Request) -> crate::error::Result<String> {
    let virtual_path = path::normalize("/", &req.path)?;
    path::to_host(&virtual_path)?;
    Ok(virtual_path)
}

fn dispatch_get_head<'a>(
    req: &Request,
    fs: &'a dyn FsAdapter,
    server_header: &str,
    head_only: bool,
    clock: &dyn ClockAdapter,
) -> DispatchOutcome<'a> {
    let date = http_date(clock.now_unix());
    let mut res = Response::new(req.close_requested, server_header.to_string(), date.clone());
    let outcome = (|| -> crate::error::Result<DispatchOutcome<'a>> {
        let virtual_path = resolve(req)?;
        let stat = fs.stat(&virtual_path)?;
        if stat.is_dir {
            return Err(Error::IsDir);
        }
        let mime = mime_guess::from_path(&virtual_path).first_or_octet_stream();
        res.add_header("Content-Type", mime.essence_str().to_string());
        if let Some(mtime) = stat.mtime {
            res.add_header("Last-Modified", http_date(mtime));
        }
        res.write_head_fixed(stat.size as usize)
            .map_err(|_| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "framing")))?;
        if head_only {
            res.finish();
            return Ok(DispatchOutcome::Complete(res));
        }
        let reader = fs.open_read(&virtual_path)?;
        Ok(DispatchOutcome::StreamGet(res, GetTransfer::new(reader)))
    })();

    match outcome {
        Ok(out) => out,
        Err(err) => {
            DispatchOutcome::Complete(Response::from_error(&err, req.close_requested, server_header.to_string(), date))
        }
    }
}

fn dispatch_put(req: &Request, fs: &dyn FsAdapter, mut res: Response) -> Response {
    let result = (|| -> crate::error::Result<()> {
        let virtual_path = resolve(req)?;
        let mut writer = fs.open_write_trunc(&virtual_path)?;
        let mut body = req.body();
        while !body.is_empty() {
            let n = writer.write(body)?;
            if n == 0 {
                return Err(Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "short write")));
            }
            body = &body[n..];
        }
        Ok(())
    })();

    match result {
        Ok(()) => {
            res.set_status(201, "Created");
            res.finish_empty();
            res
        }
        Err(err) => {
            let status = err.to_http_status();
            res.set_status(status.0, status.1);
            res.finish_empty();
            res
        }
    }
}

fn dispatch_delete(req: &Request, fs: &dyn FsAdapter, mut res: Response) -> Response {
    let result = (|| -> crate::error::Result<()> {
        let virtual_path = resolve(req)?;
        let stat = fs.stat(&virtual_path)?;
        if stat.is_dir {
            fs.remove_dir(&virtual_path)
        } else {
            fs.delete(&virtual_path)
        }
    })();

    match result {
        Ok(()) => {
            res.set_status(204, "No Content");
            res.finish_empty();
            res
        }
        Err(err) => {
            let status = err.to_http_status();
            res.set_status(status.0, status.1);
            res.finish_empty();
            res
        }
    }
}

fn dispatch_mkcol(req: &Request, fs: &dyn FsAdapter, mut res: Response) -> Response {
    let result = resolve(req).and_then(|virtual_path| fs.make_dir(&virtual_path));
    match result {
        Ok(()) => {
            res.set_status(201, "Created");
            res.finish_empty();
            res
        }
        Err(err) => {
            let status = err.to_http_status();
            res.set_status(status.0, status.1);
            res.finish_empty();
            res
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::SystemClock;
    use crate::adapters::memfs::MemFsAdapter;
    use crate::adapters::memnet::MemConn;
    use crate::dav::UnimplementedDav;
    use crate::http::framing::ByteSource;

    fn parse_req(raw: &[u8]) -> Request {
        let (mut a, mut b) = MemConn::pair();
        b.send(raw, 0).unwrap();
        let mut src = ByteSource::new(&mut a, 16 * 1024);
        Request::parse(&mut src, 0).unwrap()
    }

    #[test]
    fn options_replies_200_with_empty_body() {
        let fs = MemFsAdapter::new();
        let dav = UnimplementedDav;
        let clock = SystemClock;
        let req = parse_req(b"OPTIONS / HTTP/1.1\r\nHost: x\r\n\r\n");
        match dispatch(&req, &fs, &dav, "Paper Portal", &clock) {
            DispatchOutcome::Complete(mut res) => {
                let wire = String::from_utf8(res.take_wire()).unwrap();
                assert!(wire.starts_with("HTTP/1.1 200"));
                assert!(wire.contains("Content-Length: 0"));
            }
            _ => panic!("expected Complete"),
        }
    }

    #[test]
    fn put_then_get_round_trips_body() {
        let fs = MemFsAdapter::new();
        let dav = UnimplementedDav;
        let clock = SystemClock;
        let put = parse_req(b"PUT /f.txt HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello");
        let mut put = put;
        put.set_body(b"hello".to_vec());
        match dispatch(&put, &fs, &dav, "Paper Portal", &clock) {
            DispatchOutcome::Complete(mut res) => {
                let wire = String::from_utf8(res.take_wire()).unwrap();
                assert!(wire.starts_with("HTTP/1.1 201"));
            }
            _ => panic!("expected Complete"),
        }

        let get = parse_req(b"GET /f.txt HTTP/1.1\r\n\r\n");
        match dispatch(&get, &fs, &dav, "Paper Portal", &clock) {
            DispatchOutcome::StreamGet(mut res, mut transfer) => {
                let wire = String::from_utf8(res.take_wire()).unwrap();
                assert!(wire.contains("Content-Length: 5"));
                let (mut a, mut b) = MemConn::pair();
                let mut buf = [0u8; 64];
                loop {
                    use crate::http::transfer::TransferStep;
                    match transfer.step(&mut buf, &mut res, &mut a, 0).unwrap() {
                        TransferStep::Progress => continue,
                        TransferStep::Done => break,
                    }
                }
                let mut got = Vec::new();
                let mut tmp = [0u8; 64];
                while let Ok(n) = b.recv(&mut tmp, 0) {
                    if n == 0 {
                        break;
                    }
                    got.extend_from_slice(&tmp[..n]);
                }
                assert!(got.ends_with(b"hello"));
            }
            _ => panic!("expected StreamGet"),
        }
    }

    #[test]
    fn get_missing_file_is_404() {
        let fs = MemFsAdapter::new();
        let dav = UnimplementedDav;
        let clock = SystemClock;
        let req = parse_req(b"GET /nope HTTP/1.1\r\n\r\n");
        match dispatch(&req, &fs, &dav, "Paper Portal", &clock) {
            DispatchOutcome::Complete(mut res) => {
                let wire = String::from_utf8(res.take_wire()).unwrap();
                assert!(wire.starts_with("HTTP/1.1 404"));
            }
            _ => panic!("expected Complete"),
        }
    }
}
