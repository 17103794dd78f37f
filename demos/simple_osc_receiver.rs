use std::net::UdpSocket;
use rosc::{OscPacket, OscType, decoder};

const PARAMETER_PREFIX: &str = "/avatar/parameters/";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Parameter write receiver - listening on 127.0.0.1:9000");
    println!("Stands in for VRChat's OSC input while testing the setter");

    let socket = UdpSocket::bind("127.0.0.1:9000")?;
    println!("Waiting for parameter writes...");

    let mut buf = [0u8; rosc::decoder::MTU];

    loop {
        let (size, addr) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(e) => {
                eprintln!("Failed to receive: {}", e);
                continue;
            }
        };
        match decoder::decode_udp(&buf[..size]) {
            Ok((_, packet)) => handle_packet(packet),
            Err(e) => eprintln!("Failed to decode OSC from {}: {}", addr, e),
        }
    }
}

fn handle_packet(packet: OscPacket) {
    match packet {
        OscPacket::Message(msg) => {
            let value = match msg.args.first() {
                Some(arg) => describe_arg(arg),
                None => "<no argument>".to_string(),
            };
            // The setter only ever writes below the avatar parameter root
            match msg.addr.strip_prefix(PARAMETER_PREFIX) {
                Some(name) => println!("Parameter {} = {}", name, value),
                None => println!("Non-parameter message {} = {}", msg.addr, value),
            }
            if msg.args.len() > 1 {
                println!("  ignoring {} extra arguments", msg.args.len() - 1);
            }
        }
        OscPacket::Bundle(bundle) => {
            for pkt in bundle.content {
                handle_packet(pkt);
            }
        }
    }
}

/// Label the argument the way the parameter types are declared over OSCQuery.
fn describe_arg(arg: &OscType) -> String {
    match arg {
        OscType::Bool(b) => format!("bool {}", b),
        OscType::Int(i) => format!("int {}", i),
        OscType::Long(l) => format!("int {}", l),
        OscType::Float(f) => format!("float {}", f),
        OscType::Double(d) => format!("float {}", d),
        OscType::String(s) => format!("string '{}'", s),
        other => format!("{:?}", other),
    }
}
