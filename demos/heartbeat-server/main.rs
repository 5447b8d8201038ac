use rs_pfcp::ie::primitives::RecoveryTimeStamp;
use rs_pfcp::ie::{Ie, IeType};
use rs_pfcp::message::{Message, MsgType};
use std::net::UdpSocket;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let server_addr = "127.0.0.1:8805";

    let socket = UdpSocket::bind(server_addr)?;
    println!("Heartbeat server listening on {server_addr}");

    let mut buf = [0u8; 1500];
    loop {
        let (n, addr) = match socket.recv_from(&mut buf) {
            Ok(v) => v,
            Err(e) => {
                println!("error receiving message: {e}");
                continue;
            }
        };

        let request = match Message::unmarshal(&buf[..n]) {
            Ok(m) => m,
            Err(e) => {
                println!("ignored undecodable message from {addr}, error: {e}");
                continue;
            }
        };

        if request.msg_type() != MsgType::HeartbeatRequest {
            println!("ignored non-heartbeat message {:?} from {addr}", request.msg_type());
            continue;
        }

        println!("Received Heartbeat Request from {addr}");
        let response = Message::new(
            MsgType::HeartbeatResponse,
            request.sequence(),
            vec![Ie::new(IeType::RecoveryTimeStamp, RecoveryTimeStamp::now().marshal().to_vec())],
        );
        match response.marshal() {
            Ok(bytes) => {
                socket.send_to(&bytes, addr)?;
                println!("Sent Heartbeat Response to {addr}");
            }
            Err(e) => println!("failed to marshal response: {e}"),
        }
    }
}
