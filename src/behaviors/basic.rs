//! The basic misbehaviors.
//!
//! Each one is a small, deliberately pathological way of handling a
//! connection: close it, stall it, drip bytes, or flood it.

use crate::behavior::{Behavior, Options};
use crate::stream::Connection;
use rand::Rng;
use tokio::time::sleep;

/// Closes the connection immediately after it is made.
pub struct CloseImmediately;

#[async_trait::async_trait]
impl Behavior for CloseImmediately {
    fn name(&self) -> &str {
        "CloseImmediately"
    }

    async fn handle(&self, _conn: &mut Connection, _options: &Options) -> std::io::Result<()> {
        // do nothing
        Ok(())
    }
}

/// Accepts a connection, pauses a fixed duration, then closes it.
///
/// Options:
/// - `duration`: seconds to wait before disconnect. Default: 30
pub struct CloseAfterPause;

#[async_trait::async_trait]
impl Behavior for CloseAfterPause {
    fn name(&self) -> &str {
        "CloseAfterPause"
    }

    async fn handle(&self, _conn: &mut Connection, options: &Options) -> std::io::Result<()> {
        sleep(options.secs_or("duration", 30.0)).await;
        Ok(())
    }
}

/// Sends a static response.
///
/// Options:
/// - `message`: the response to send. Default: "Hello, world!"
pub struct FixedResponse;

#[async_trait::async_trait]
impl Behavior for FixedResponse {
    fn name(&self) -> &str {
        "FixedResponse"
    }

    async fn handle(&self, conn: &mut Connection, options: &Options) -> std::io::Result<()> {
        let message = options.str_or("message", "Hello, world!");
        conn.write_str(&message).await
    }
}

/// Sends a newline character as the only response.
pub struct NewlineResponse;

#[async_trait::async_trait]
impl Behavior for NewlineResponse {
    fn name(&self) -> &str {
        "NewlineResponse"
    }

    async fn handle(&self, conn: &mut Connection, _options: &Options) -> std::io::Result<()> {
        conn.write_str("\n").await
    }
}

/// Sends a random lowercase string, between 1 and 26 characters long.
pub struct RandomResponse;

#[async_trait::async_trait]
impl Behavior for RandomResponse {
    fn name(&self) -> &str {
        "RandomResponse"
    }

    async fn handle(&self, conn: &mut Connection, _options: &Options) -> std::io::Result<()> {
        let message = random_string();
        conn.write_str(&message).await
    }
}

fn random_string() -> String {
    let mut rng = rand::thread_rng();
    let length = rng.gen_range(1..=26);
    (0..length).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

/// Sends a fixed response character-by-character, pausing between each.
///
/// Options:
/// - `message`: the response to send. Default: "Hello, world!"
/// - `pause_duration`: seconds to pause between characters. Default: 10
pub struct SlowResponse;

#[async_trait::async_trait]
impl Behavior for SlowResponse {
    fn name(&self) -> &str {
        "SlowResponse"
    }

    async fn handle(&self, conn: &mut Connection, options: &Options) -> std::io::Result<()> {
        let message = options.str_or("message", "Hello, world!");
        let pause = options.secs_or("pause_duration", 10.0);

        let mut buf = [0u8; 4];
        for ch in message.chars() {
            conn.write_str(ch.encode_utf8(&mut buf)).await?;
            sleep(pause).await;
        }
        Ok(())
    }
}

/// Accepts a connection and never sends a byte. The connection is left open
/// indefinitely.
pub struct NeverRespond;

#[async_trait::async_trait]
impl Behavior for NeverRespond {
    fn name(&self) -> &str {
        "NeverRespond"
    }

    async fn handle(&self, _conn: &mut Connection, _options: &Options) -> std::io::Result<()> {
        loop {
            sleep(std::time::Duration::from_secs(1)).await;
        }
    }
}

/// Sends a large response of repeated 'x' characters, one write per byte.
///
/// Options:
/// - `length`: response size in bytes. Default: 1,000,000
pub struct DelugeResponse;

#[async_trait::async_trait]
impl Behavior for DelugeResponse {
    fn name(&self) -> &str {
        "DelugeResponse"
    }

    async fn handle(&self, conn: &mut Connection, options: &Options) -> std::io::Result<()> {
        let length = options.int_or("length", 1_000_000).max(0);
        for _ in 0..length {
            conn.write_bytes(b"x").await?;
        }
        Ok(())
    }
}
