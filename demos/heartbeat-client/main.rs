use rs_pfcp::ie::primitives::RecoveryTimeStamp;
use rs_pfcp::ie::{Ie, IeType};
use rs_pfcp::message::{Message, MsgType};
use std::net::UdpSocket;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let server_addr = "127.0.0.1:8805";

    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect(server_addr)?;

    let request = Message::new(
        MsgType::HeartbeatRequest,
        1,
        vec![Ie::new(IeType::RecoveryTimeStamp, RecoveryTimeStamp::now().marshal().to_vec())],
    );
    socket.send(&request.marshal()?)?;
    println!("sent Heartbeat Request to: {server_addr}");

    socket.set_read_timeout(Some(Duration::from_secs(3)))?;

    let mut buf = [0u8; 1500];
    loop {
        match socket.recv(&mut buf) {
            Ok(n) => match Message::unmarshal(&buf[..n]) {
                Ok(response) if response.msg_type() == MsgType::HeartbeatResponse => {
                    match response.first_ie(IeType::RecoveryTimeStamp).and_then(Ie::leaf_bytes).map(RecoveryTimeStamp::unmarshal) {
                        Some(Ok(ts)) => println!("got Heartbeat Response with TS: {:?}", ts),
                        Some(Err(e)) => println!("got Heartbeat Response with invalid TS: {e}"),
                        None => println!("got Heartbeat Response without TS"),
                    }
                    break;
                }
                Ok(other) => {
                    println!("ignored unexpected message type: {:?}", other.msg_type());
                    continue;
                }
                Err(e) => {
                    println!("ignored undecodable message, error: {e}");
                    continue;
                }
            },
            Err(e) => {
                println!("error receiving message: {e}");
                break;
            }
        }
    }

    Ok(())
}
