use std::thread;
use std::time::Duration;
use rosc::{OscMessage, OscPacket, OscType, encoder};
use std::net::UdpSocket;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("OSC Sender Test - sending to 127.0.0.1:9000");

    let socket = UdpSocket::bind("0.0.0.0:0")?;
    let target_addr = "127.0.0.1:9000";

    // The parameter writes the main program performs by default
    let test_messages = vec![
        ("/avatar/parameters/VRCEmote", OscType::Int(20)),
        ("/avatar/parameters/VRCEmote", OscType::Int(0)),
        ("/avatar/parameters/MuteSelf", OscType::Bool(true)),
        ("/avatar/parameters/MuteSelf", OscType::Bool(false)),
    ];

    for (path, value) in test_messages {
        let osc_msg = OscMessage {
            addr: path.to_string(),
            args: vec![value.clone()],
        };

        let packet = OscPacket::Message(osc_msg);
        let msg_buf = encoder::encode(&packet)?;

        socket.send_to(&msg_buf, target_addr)?;
        println!("Sent OSC: {} = {:?}", path, value);

        thread::sleep(Duration::from_millis(500));
    }

    println!("Test completed!");
    Ok(())
}
