// tests/relay_io.rs
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, shell, shell_relay, shell_relay_with, with_timeout, EventRecorder, ScriptDir};

use std::time::Duration;

use execpp::relay::{DeliveryContext, ProcessRelay, RelayConfig, RelayEvent};

const ECHO_ONE: &str = "read line\necho \"$line\"";

#[tokio::test]
async fn written_line_is_echoed_before_exit() {
    init_tracing();
    let scripts = ScriptDir::new();
    let script = scripts.script("echo.sh", ECHO_ONE);

    let relay = shell_relay();
    let recorder = EventRecorder::attach(&relay);
    relay.start(&[script.as_str()]).unwrap();

    relay.write_line("hello");
    let code = with_timeout(relay.wait_for_exit()).await.unwrap();

    assert_eq!(code, 0);
    assert_eq!(recorder.stdout(), "hello\n");
    assert_eq!(recorder.events().last(), Some(&RelayEvent::Exited(0)));
}

#[tokio::test]
async fn plain_write_gets_a_line_terminator() {
    let scripts = ScriptDir::new();
    let script = scripts.script("echo.sh", ECHO_ONE);

    let relay = shell_relay();
    let recorder = EventRecorder::attach(&relay);
    relay.start(&[script.as_str()]).unwrap();

    relay.write("hello");
    with_timeout(relay.wait_for_exit()).await.unwrap();

    assert_eq!(recorder.stdout(), "hello\n");
}

#[tokio::test]
async fn unflushed_write_is_replaced_by_newer_one() {
    init_tracing();
    let scripts = ScriptDir::new();
    let script = scripts.script("echo.sh", "read line\necho \"got:$line\"");

    let relay = shell_relay();
    let recorder = EventRecorder::attach(&relay);
    relay.start(&[script.as_str()]).unwrap();

    // Single-threaded runtime: the stdin pump cannot run between these calls.
    relay.write_line("A");
    relay.write_line("B");

    with_timeout(relay.wait_for_exit()).await.unwrap();
    assert_eq!(recorder.stdout(), "got:B\n");
}

#[tokio::test]
async fn flushed_writes_arrive_in_order() {
    init_tracing();
    let scripts = ScriptDir::new();
    let script = scripts.script("echo2.sh", "read a\necho \"$a\"\nread b\necho \"$b\"");

    let relay = shell_relay();
    let recorder = EventRecorder::attach(&relay);
    relay.start(&[script.as_str()]).unwrap();

    relay.write_line("A");
    recorder.wait_for_stdout("A\n").await;
    relay.write_line("B");

    with_timeout(relay.wait_for_exit()).await.unwrap();
    assert_eq!(recorder.stdout(), "A\nB\n");
}

#[tokio::test]
async fn absent_write_never_reaches_stdin() {
    let scripts = ScriptDir::new();
    let script = scripts.script("bracket.sh", "read line\necho \"[$line]\"");

    let relay = shell_relay();
    let recorder = EventRecorder::attach(&relay);
    relay.start(&[script.as_str()]).unwrap();

    relay.write(None);
    relay.write_line(None);
    assert!(!relay.has_pending_input());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(relay.is_running());

    relay.write_line("hi");
    with_timeout(relay.wait_for_exit()).await.unwrap();
    assert_eq!(recorder.stdout(), "[hi]\n");
}

#[tokio::test]
async fn each_stream_keeps_its_own_order() {
    init_tracing();
    let scripts = ScriptDir::new();
    let script = scripts.script(
        "both.sh",
        "echo out1\necho err1 >&2\necho out2\necho err2 >&2\necho out3",
    );

    let relay = shell_relay();
    let recorder = EventRecorder::attach(&relay);
    relay.start(&[script.as_str()]).unwrap();
    with_timeout(relay.wait_for_exit()).await.unwrap();

    assert_eq!(recorder.stdout(), "out1\nout2\nout3\n");
    assert_eq!(recorder.stderr(), "err1\nerr2\n");
}

#[tokio::test]
async fn chunks_respect_configured_size() {
    let scripts = ScriptDir::new();
    let script = scripts.script("letters.sh", "printf 'abcdefghij'");

    let relay = shell_relay_with(RelayConfig {
        chunk_size: 4,
        ..RelayConfig::default()
    });
    let recorder = EventRecorder::attach(&relay);
    relay.start(&[script.as_str()]).unwrap();
    with_timeout(relay.wait_for_exit()).await.unwrap();

    let chunks = recorder.stdout_chunks();
    assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= 4), "{chunks:?}");
    assert_eq!(chunks.concat(), "abcdefghij");
}

#[tokio::test]
async fn multibyte_text_survives_tiny_chunks() {
    let scripts = ScriptDir::new();
    let script = scripts.script("utf8.sh", "printf 'h\\303\\251llo \\342\\202\\254'");

    let relay = shell_relay_with(RelayConfig {
        chunk_size: 1,
        ..RelayConfig::default()
    });
    let recorder = EventRecorder::attach(&relay);
    relay.start(&[script.as_str()]).unwrap();
    with_timeout(relay.wait_for_exit()).await.unwrap();

    assert_eq!(recorder.stdout(), "héllo €");
}

#[tokio::test]
async fn arguments_are_split_on_spaces() {
    let scripts = ScriptDir::new();
    let script = scripts.script("argc.sh", "echo \"$#:$1\"");

    let relay = shell_relay();
    let recorder = EventRecorder::attach(&relay);
    relay.start(&[script.as_str(), "a b", "c"]).unwrap();
    with_timeout(relay.wait_for_exit()).await.unwrap();

    assert_eq!(recorder.stdout(), "3:a\n");
}

#[tokio::test]
async fn delivery_context_defers_notifications() {
    let scripts = ScriptDir::new();
    let script = scripts.script("ctx.sh", "echo ctx\nexit 7");

    let (context, mut delivery) = DeliveryContext::channel();
    let relay = ProcessRelay::new(shell()).with_delivery_context(context);
    let recorder = EventRecorder::attach(&relay);
    relay.start(&[script.as_str()]).unwrap();

    let code = with_timeout(relay.wait_for_exit()).await.unwrap();
    assert_eq!(code, 7);
    assert!(recorder.events().is_empty());

    assert!(delivery.run_pending() >= 2);
    assert_eq!(recorder.stdout(), "ctx\n");
    assert_eq!(recorder.events().last(), Some(&RelayEvent::Exited(7)));
}

#[tokio::test]
async fn delivery_loop_task_receives_everything() {
    let scripts = ScriptDir::new();
    let script = scripts.script("ctx.sh", "echo one\necho two >&2");

    let (context, delivery) = DeliveryContext::channel();
    let relay = ProcessRelay::new(shell()).with_delivery_context(context);
    let recorder = EventRecorder::attach(&relay);
    let delivery_task = tokio::spawn(delivery.run());

    relay.start(&[script.as_str()]).unwrap();
    with_timeout(relay.wait_for_exit()).await.unwrap();

    // Dropping the relay drops the last context handle and ends the loop.
    drop(relay);
    with_timeout(delivery_task).await.unwrap();

    assert_eq!(recorder.stdout(), "one\n");
    assert_eq!(recorder.stderr(), "two\n");
    assert_eq!(recorder.exit_codes(), vec![0]);
}
