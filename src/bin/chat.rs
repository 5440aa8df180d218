//! Terminal chat client for a running `FitFinder` server
//!
//! Reads lines from stdin and posts them to the session API.
//! `/accessories` asks for accessories after a product search, `/quit` ends
//! the session.

use serde_json::{json, Value};
use std::io::{self, BufRead, Write};

const DEFAULT_URL: &str = "http://127.0.0.1:8000";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base = std::env::var("FITFINDER_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
    let base = base.trim_end_matches('/').to_string();

    let created: Value = ureq::post(&format!("{base}/api/sessions"))
        .call()?
        .into_json()?;
    let id = created["id"]
        .as_str()
        .ok_or("server did not return a session id")?
        .to_string();
    let session_url = format!("{base}/api/sessions/{id}");

    println!("FitFinder - your AI stylist. Ask what to wear. /quit to leave.");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        let result = match line {
            "" => continue,
            "/quit" => break,
            "/accessories" => {
                println!("[Searching for accessories...]");
                ureq::post(&format!("{session_url}/accessories")).call()
            }
            text => ureq::post(&format!("{session_url}/chat")).send_json(json!({ "text": text })),
        };

        match result {
            Ok(response) => print_turn(&response.into_json()?),
            Err(ureq::Error::Status(status, response)) => {
                let body: Value = response.into_json().unwrap_or(Value::Null);
                let message = body["error"].as_str().unwrap_or("request failed");
                eprintln!("error ({status}): {message}");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let _ = ureq::delete(&session_url).call();
    Ok(())
}

fn print_turn(view: &Value) {
    let entries = view["entries"].as_array().map_or(&[][..], Vec::as_slice);
    for entry in entries.iter().filter(|e| e["role"] == "assistant") {
        if let Some(text) = entry["text"].as_str() {
            println!("{text}");
        }
    }

    let products = view["products"].as_array().map_or(&[][..], Vec::as_slice);
    if !products.is_empty() {
        println!("\nStyled picks just for you:");
        for product in products {
            println!(
                "  * {} - {} ({})\n    {}",
                product["title"].as_str().unwrap_or("untitled"),
                product["price"].as_str().unwrap_or("price n/a"),
                product["source"].as_str().unwrap_or("unknown store"),
                product["link"].as_str().unwrap_or(""),
            );
        }
    }

    if view["accessories_offered"] == true {
        println!("\nWant matching accessories? Type /accessories");
    }
}
