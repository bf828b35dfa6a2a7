mod support;

use setpoint_bridge::{
    bridge::Bridge,
    console::{run, Action},
};
use support::{FakeConnector, Script};

#[tokio::test(start_paused = true)]
async fn console_drives_the_bridge(){
    let (connector, wire) = FakeConnector::new(Script::default());
    let bridge = Bridge::builder(connector).build().await;

    assert_eq!(run(&bridge, Action::parse("target+")).await.as_deref(), Some("target=7, minimo=5, maximo=8"));
    assert_eq!(run(&bridge, Action::parse("max-")).await.as_deref(), Some("target=7, minimo=5, maximo=8"));

    wire.reply("OK");
    let out = run(&bridge, Action::parse("exec")).await.unwrap();
    assert_eq!(out, "SP:7,SM:8,Sm:5 sent, device confirmed: OK");

    let out = run(&bridge, Action::parse("exec")).await.unwrap();
    assert_eq!(out, "SP:7,SM:8,Sm:5 sent, no response captured");

    assert_eq!(wire.text(), "SP:7,SM:8,Sm:5\nSP:7,SM:8,Sm:5\n");
    assert_eq!(run(&bridge, Action::parse("quit")).await, None);
}

#[tokio::test(start_paused = true)]
async fn console_sends_any_free_text(){
    let (connector, wire) = FakeConnector::new(Script::default());
    let bridge = Bridge::builder(connector).build().await;

    let out = run(&bridge, Action::parse("send SP:20,SM:21,Sm:19")).await.unwrap();
    assert!(out.starts_with('{'));
    assert!(out.contains("\"status\":\"success\""));
    assert_eq!(wire.text(), "SP:20,SM:21,Sm:19\n");

    // anything else still goes out, with a note
    wire.reply("PONG");
    let out = run(&bridge, Action::parse("send PING")).await.unwrap();
    assert!(out.starts_with("Note: not in SP:value,SM:value,Sm:value form\n"));
    assert!(out.contains("\"response\":\"PONG\""));
    assert_eq!(wire.text(), "SP:20,SM:21,Sm:19\nPING\n");
}

#[tokio::test(start_paused = true)]
async fn console_status_shows_last_error(){
    let (connector, _wire) = FakeConnector::new(Script{fail_opens: usize::MAX, ..Default::default()});
    let bridge = Bridge::builder(connector).build().await;

    let out = run(&bridge, Action::parse("status")).await.unwrap();
    assert!(out.contains("\"connected\": false"));
    assert!(out.contains("\"device_path\": \"/dev/fake_uart\""));
    assert!(out.contains("last error: device unavailable: no such device"));

    let out = run(&bridge, Action::parse("logs")).await.unwrap();
    assert!(out.starts_with("Could not read history"));
}
