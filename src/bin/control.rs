//! Terminal control client: every line on stdin is a press of the print
//! button.

use anyhow::Result;
use clap::Parser;
use scanner_wall_lib::client::spawn_session;
use scanner_wall_lib::config::ControlConfig;
use scanner_wall_lib::control::driver::{run_control, ControlPorts};
use scanner_wall_lib::control::{ControlMachine, ControlStatus};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

#[tokio::main]
async fn main() -> Result<()> {
    scanner_wall_lib::init_tracing();
    let config = ControlConfig::parse();

    let (link, session) = spawn_session(config.link.url.clone(), config.link.reconnect_delay());
    let (trigger_tx, triggers) = mpsc::channel(4);
    let (status_tx, mut status) = watch::channel(ControlStatus::default());

    let driver = tokio::spawn(run_control(
        ControlMachine::new(config.busy_timeout()),
        ControlPorts {
            triggers,
            inbound: link.inbound,
            outbound: link.outbound,
            link: link.open,
            status: status_tx,
        },
    ));

    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let now = *status.borrow_and_update();
            println!("[{}]", now.label());
        }
    });

    println!("Press Enter to print. Ctrl-D to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while lines.next_line().await?.is_some() {
        // A full queue means presses are already pending; extra ones are moot.
        let _ = trigger_tx.try_send(());
    }

    drop(trigger_tx);
    let _ = driver.await;
    session.abort();
    Ok(())
}
