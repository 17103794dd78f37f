use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

mod config;
mod general;
mod params;
mod remote;

use params::{set_parameter, ParamValue, WriteOutcome};
use remote::discovery::{find_service, MdnsBrowser};
use remote::osc_sender::OscSender;
use remote::query::{fetch_parameter, Fetched, OscQueryClient, ParameterQuery};

/// Global debug flag, set once from config at startup. Gates the verbose
/// `[OSC]` / `[mDNS]` prints.
pub static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::SeqCst)
}

fn main() {
    match run() {
        Ok(_) => (),
        Err(err) => println!("Error: {}", err),
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = config::load("config.json");
    DEBUG_ENABLED.store(config.debug, Ordering::SeqCst);

    println!("Searching for {} OSCQuery service...", config.service_name);
    let browser = MdnsBrowser::new()?;
    let service = match find_service(
        &browser,
        &config.service_name,
        config.discovery_tries,
        Duration::from_millis(config.discovery_delay_ms),
    ) {
        Some(service) => service,
        None => {
            general::check::print_service_missing(&config.service_name, config.discovery_tries);
            return Ok(());
        }
    };
    general::check::print_service_found(&config.service_name);
    if is_debug_enabled() {
        println!(
            "[mDNS] resolved {} at {}:{} ({})",
            service.name, service.address, service.port, service.transport
        );
    }

    let client = OscQueryClient::new(&service);
    let host_info = match client.host_info() {
        Ok(info) => info,
        Err(err) => {
            eprintln!("[OSCQuery] host info request to '{}' failed: {}", service.name, err);
            return Ok(());
        }
    };

    // The HOST_INFO reply may omit the OSC IP; fall back to the discovered address.
    let osc_ip = host_info
        .osc_ip
        .clone()
        .unwrap_or_else(|| service.address.to_string());

    println!("\nConnected to: {}", host_info.name);
    println!("OSC IP: {}", osc_ip);
    println!("OSC Port: {}", host_info.osc_port);
    println!("Transport: {}", host_info.osc_transport);

    match client.query_node("/avatar/parameters") {
        Ok(Some(root)) => println!("Avatar advertises {} parameters.", root.child_count()),
        Ok(None) => {
            println!("Failed to query avatar parameters.");
            return Ok(());
        }
        Err(err) => {
            eprintln!("[OSCQuery] avatar parameter lookup failed: {}", err);
            return Ok(());
        }
    }

    if let Fetched::Node(param) = fetch_parameter(&client, "/avatar/parameters/VRCEmote") {
        println!("Found parameter: {}", param.full_path);
        println!("  Type: {}", param.type_tags.as_deref().unwrap_or("unknown"));
        println!("  Value: {}", param.display_value());
        match param.access_mode() {
            Some(mode) => println!("  Access: {}", mode.name()),
            None => println!("  Access: Unknown"),
        }
    }

    for step in &config.writes {
        let value = match ParamValue::from_json(&step.value) {
            Some(value) => value,
            None => {
                println!(
                    "Skipping write to '{}': unsupported value {} in config",
                    step.path, step.value
                );
                continue;
            }
        };
        // One fresh socket per write; the sender is fire-and-forget.
        let mut sender = match OscSender::new(&osc_ip, host_info.osc_port) {
            Ok(sender) => sender,
            Err(err) => {
                eprintln!("[OSC] could not open send socket: {}", err);
                continue;
            }
        };
        match set_parameter(&client, &mut sender, &step.path, &value) {
            WriteOutcome::Sent => println!("Set {} = {}", step.path, value),
            // Rejections and faults already printed a notice where they were detected.
            WriteOutcome::Rejected(_) | WriteOutcome::QueryFailed(_) | WriteOutcome::SendFailed(_) => (),
        }
        if step.pause_ms > 0 {
            thread::sleep(Duration::from_millis(step.pause_ms));
        }
    }

    Ok(())
}
