//! End-to-end FTP scenarios (spec §8), driven purely through `Tickable::tick`
//! and the in-memory adapters, the way a real client/server pair would
//! behave over the wire.

use paper_portal_fs::adapters::clock::SystemClock;
use paper_portal_fs::adapters::memfs::MemFsAdapter;
use paper_portal_fs::adapters::memnet::{MemConn, MemNet};
use paper_portal_fs::adapters::net::Connection;
use paper_portal_fs::config::FtpConfig;
use paper_portal_fs::ftp::FtpServer;
use paper_portal_fs::server::Tickable;

/// Drain whatever bytes are immediately available on `conn`, non-blocking.
fn recv_all(conn: &mut MemConn) -> Vec<u8> {
    let mut out = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match conn.recv(&mut buf, 0) {
            Ok(0) => break,
            Ok(n) => out.extend_from_slice(&buf[..n]),
            Err(_) => break,
        }
    }
    out
}

fn reply_code(line: &[u8]) -> u16 {
    let text = std::str::from_utf8(line).unwrap();
    text.split_whitespace().next().unwrap().parse().unwrap()
}

/// Wire up an `FtpServer` plus a connected client `MemConn`, ticked once so
/// the banner has already been sent. `net` is owned by the caller, since
/// `server` borrows it for the rest of its lifetime once `start` runs.
fn connected_session<'a>(
    fs: &'a MemFsAdapter,
    clock: &'a SystemClock,
    net: &'a mut MemNet,
) -> (FtpServer<'a>, MemConn) {
    let registry = net.registry();
    let mut server = FtpServer::new(FtpConfig::default(), fs, clock);
    server.start(net).unwrap();

    let handle = registry.handle_for(21).unwrap();
    let (client, srv_side) = MemConn::pair();
    handle.push(srv_side);

    server.tick(0); // accept + banner
    (server, client)
}

fn send_command(server: &mut FtpServer<'_>, client: &mut MemConn, line: &str) -> Vec<u8> {
    client.send(format!("{line}\r\n").as_bytes(), 0).unwrap();
    server.tick(0);
    recv_all(client)
}

#[test]
fn banner_login_pwd_quit() {
    let fs = MemFsAdapter::new();
    let clock = SystemClock;
    let mut net = MemNet::default();
    let (mut server, mut client) = connected_session(&fs, &clock, &mut net);

    let banner = recv_all(&mut client);
    assert_eq!(reply_code(&banner), 220);

    assert_eq!(reply_code(&send_command(&mut server, &mut client, "USER paper")), 331);
    assert_eq!(reply_code(&send_command(&mut server, &mut client, "PASS paper")), 230);

    let pwd = send_command(&mut server, &mut client, "PWD");
    assert_eq!(reply_code(&pwd), 257);
    assert!(std::str::from_utf8(&pwd).unwrap().contains("\"/\""));

    let quit = send_command(&mut server, &mut client, "QUIT");
    assert_eq!(reply_code(&quit), 221);

    // QUIT closed the control connection; the listener itself stays up for
    // the next client.
    assert!(server.is_running());
}

fn login(server: &mut FtpServer<'_>, client: &mut MemConn) {
    recv_all(client); // banner
    assert_eq!(reply_code(&send_command(server, client, "USER paper")), 331);
    assert_eq!(reply_code(&send_command(server, client, "PASS paper")), 230);
}

#[test]
fn pasv_retr_of_seeded_file() {
    let fs = MemFsAdapter::new();
    fs.seed_file("/hello.txt", b"abcde", 0);
    let clock = SystemClock;
    let mut net = MemNet::default();
    let registry = net.registry();
    let mut server = FtpServer::new(FtpConfig::default(), &fs, &clock);
    server.start(&mut net).unwrap();

    let control_handle = registry.handle_for(21).unwrap();
    let (mut client, srv_side) = MemConn::pair();
    control_handle.push(srv_side);
    server.tick(0); // banner

    login(&mut server, &mut client);

    let pasv = send_command(&mut server, &mut client, "PASV");
    assert_eq!(reply_code(&pasv), 227);
    let text = std::str::from_utf8(&pasv).unwrap();
    let (_, data_port) = paper_portal_fs::ftp::passive::parse_tuple(text).unwrap();

    let data_handle = registry.handle_for(data_port).unwrap();
    let (mut data_client, data_srv_side) = MemConn::pair();
    data_handle.push(data_srv_side);

    let retr = send_command(&mut server, &mut client, "RETR hello.txt");
    assert_eq!(reply_code(&retr), 150);

    // One tick per transfer step: accept the data connection, then copy.
    let mut got = Vec::new();
    for _ in 0..16 {
        server.tick(0);
        got.extend_from_slice(&recv_all(&mut data_client));
        if let Some(line) = try_recv_reply(&mut client) {
            assert_eq!(reply_code(&line), 226);
            break;
        }
    }
    assert_eq!(got, b"abcde");
}

fn try_recv_reply(conn: &mut MemConn) -> Option<Vec<u8>> {
    let bytes = recv_all(conn);
    if bytes.is_empty() {
        None
    } else {
        Some(bytes)
    }
}

#[test]
fn pasv_stor_then_size() {
    let fs = MemFsAdapter::new();
    let clock = SystemClock;
    let mut net = MemNet::default();
    let registry = net.registry();
    let mut server = FtpServer::new(FtpConfig::default(), &fs, &clock);
    server.start(&mut net).unwrap();

    let control_handle = registry.handle_for(21).unwrap();
    let (mut client, srv_side) = MemConn::pair();
    control_handle.push(srv_side);
    server.tick(0);
    login(&mut server, &mut client);

    let pasv = send_command(&mut server, &mut client, "PASV");
    let text = std::str::from_utf8(&pasv).unwrap();
    let (_, data_port) = paper_portal_fs::ftp::passive::parse_tuple(text).unwrap();
    let data_handle = registry.handle_for(data_port).unwrap();
    let (mut data_client, data_srv_side) = MemConn::pair();
    data_handle.push(data_srv_side);

    let stor = send_command(&mut server, &mut client, "STOR up.bin");
    assert_eq!(reply_code(&stor), 150);

    let payload = vec![0x42u8; 4096];
    data_client.send(&payload, 0).unwrap();
    // 226 is only sent once the data side signals EOF by closing.
    data_client.close();

    let mut done = false;
    for _ in 0..16 {
        server.tick(0);
        if let Some(line) = try_recv_reply(&mut client) {
            assert_eq!(reply_code(&line), 226);
            done = true;
            break;
        }
    }
    assert!(done, "STOR never completed");

    let size = send_command(&mut server, &mut client, "SIZE up.bin");
    assert_eq!(reply_code(&size), 213);
    assert!(std::str::from_utf8(&size).unwrap().contains("4096"));
}

#[test]
fn cwd_dotdot_from_root_then_cwd_nonexistent() {
    let fs = MemFsAdapter::new();
    fs.seed_dir("/sub");
    let clock = SystemClock;
    let mut net = MemNet::default();
    let (mut server, mut client) = connected_session(&fs, &clock, &mut net);
    login(&mut server, &mut client);

    // Root's `..` clamps at the virtual root rather than erroring.
    let cdup = send_command(&mut server, &mut client, "CWD ..");
    assert_eq!(reply_code(&cdup), 250);
    let pwd = send_command(&mut server, &mut client, "PWD");
    assert!(std::str::from_utf8(&pwd).unwrap().contains("\"/\""));

    let missing = send_command(&mut server, &mut client, "CWD /does/not/exist");
    assert_eq!(reply_code(&missing), 550);
}

#[test]
fn rnfr_of_missing_source_then_rnto_fails_and_clears_pending_state() {
    let fs = MemFsAdapter::new();
    let clock = SystemClock;
    let mut net = MemNet::default();
    let (mut server, mut client) = connected_session(&fs, &clock, &mut net);
    login(&mut server, &mut client);

    let rnfr = send_command(&mut server, &mut client, "RNFR ghost.txt");
    assert_eq!(reply_code(&rnfr), 350);

    let rnto = send_command(&mut server, &mut client, "RNTO elsewhere.txt");
    assert_eq!(reply_code(&rnto), 550);

    // Pending rename state was consumed by the failed RNTO: a second RNTO
    // with no prior RNFR must now report "RNFR required first."
    let second_rnto = send_command(&mut server, &mut client, "RNTO elsewhere.txt");
    assert_eq!(reply_code(&second_rnto), 503);
}
