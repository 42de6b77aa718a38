//! Send one request on a serial port and print the reply.
//!
//! Usage: `cargo run --example poll-once -- /dev/ttyUSB0 [baud]`

use std::time::Duration;

use stdbus::Link;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let port = args.next().ok_or("usage: poll-once <port> [baud]")?;
    let baud: u32 = match args.next() {
        Some(rate) => rate.parse()?,
        None => 9600,
    };

    let mut link = Link::open(&port, baud, Duration::from_millis(100))?;
    println!("opened {port} ({})", link.line_config());

    let reply = link.exchange(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x01])?;
    println!("reply: {:02x?}", reply.as_ref());

    Ok(())
}
