mod test_hang_up;
mod test_renegotiation;

use crate::utils::{Loopback, TestPeer, pump};
use tandem_client::Phase;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Two peers seated in one room, welcomes and join acks already applied.
pub async fn paired_peers(room: &str) -> (Loopback, TestPeer, TestPeer) {
    init_tracing();

    let loopback = Loopback::new();
    let mut a = loopback.peer("a");
    let mut b = loopback.peer("b");

    a.join(room).await;
    b.join(room).await;
    pump(&mut a, &mut b).await;

    assert_eq!(a.client.room(), Some(room));
    assert_eq!(b.client.room(), Some(room));
    (loopback, a, b)
}

/// Drives a's call to b through to both sessions being connected.
pub async fn connect_call(a: &mut TestPeer, b: &mut TestPeer) {
    a.client.call().await.expect("call failed");
    pump(a, b).await;

    assert_eq!(a.client.phase_of(&b.id), Some(Phase::Connected));
    assert_eq!(b.client.phase_of(&a.id), Some(Phase::Connected));
}
