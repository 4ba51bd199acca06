//! Example: Extracting a refund candidate from a single email.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example extract_message -- path/to/message.eml
//! ```
//!
//! Without an argument a built-in sample message is used.

use std::env;
use trainalyze::{extract, Message};

const SAMPLE: &str = "From: Avanti West Coast <noreply@avantiwestcoast.co.uk>\r\n\
Subject: Sorry your train was delayed\r\n\
Date: Tue, 4 Mar 2025 18:42:00 +0000\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Booking reference: AV4821973\r\n\
Your 16:30 from London Euston to Manchester Piccadilly arrived 42 minutes late.\r\n\
Ticket price: £89.00\r\n\
Travel date: 04/03/2025\r\n";

fn main() -> trainalyze::Result<()> {
    let raw = match env::args().nth(1) {
        Some(path) => std::fs::read(&path).map_err(|source| trainalyze::Error::Io {
            path: path.into(),
            source,
        })?,
        None => SAMPLE.as_bytes().to_vec(),
    };

    let message = Message::from_rfc822("cli", &raw)?;

    match extract(&message) {
        Some(candidate) => println!(
            "{}",
            serde_json::to_string_pretty(&candidate).expect("candidate serializes")
        ),
        None => println!("Not a transport email: {:?}", message.subject()),
    }
    Ok(())
}
