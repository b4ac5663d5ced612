//! Helper structs for setting up test scenarios.

use cesr_kernel_core::{
    dispatch, Credential, Event, Keypair, Message, Sad, Said,
};
use serde_json::{json, Map, Value};

/// A fresh random 32-byte seed.
pub fn random_seed() -> [u8; 32] {
    rand::random()
}

/// A test identity: one keypair and builders for the documents it authors.
#[derive(Debug, Clone)]
pub struct TestFixture {
    keypair: Keypair,
}

impl TestFixture {
    /// A fixture with a random keypair.
    pub fn new() -> Self {
        Self {
            keypair: Keypair::generate(),
        }
    }

    /// A deterministic fixture.
    pub fn with_seed(seed: &[u8; 32]) -> Self {
        Self {
            keypair: Keypair::from_seed(seed),
        }
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// The identifier prefix, the public key in qb64.
    pub fn aid(&self) -> String {
        self.keypair.public_key().qb64()
    }

    /// An inception event for this identity.
    pub fn make_inception(&self) -> Event {
        let map = object(json!({
            "v": "KERI10JSON000000_",
            "t": "icp",
            "d": "",
            "i": self.aid(),
            "s": "0",
            "kt": "1",
            "k": [self.aid()],
            "nt": "0",
            "n": [],
            "bt": "0",
            "b": [],
            "c": [],
            "a": [],
        }));
        expect_event(Sad::from_map(map).expect("inception builds"))
    }

    /// An interaction event anchoring one seal.
    pub fn make_interaction(&self, sn: u64, prior: &Said, seal: Value) -> Event {
        let map = object(json!({
            "v": "KERI10JSON000000_",
            "t": "ixn",
            "d": "",
            "i": self.aid(),
            "s": format!("{sn:x}"),
            "p": prior.qb64(),
            "a": [seal],
        }));
        expect_event(Sad::from_map(map).expect("interaction builds"))
    }

    /// A credential issued by this identity.
    pub fn make_credential(
        &self,
        schema: &Said,
        attributes: Value,
        recipient: Option<&str>,
    ) -> Credential {
        let mut attrs = match attributes {
            Value::Object(map) => map,
            other => object(json!({ "value": other })),
        };
        if let Some(recipient) = recipient {
            attrs.insert("i".to_string(), json!(recipient));
        }
        let map = object(json!({
            "v": "ACDC10JSON000000_",
            "d": "",
            "i": self.aid(),
            "s": schema.qb64(),
            "a": attrs,
        }));
        let Message::Credential(cred) =
            dispatch(Sad::from_map(map).expect("credential builds"))
        else {
            unreachable!("credential protocol dispatches to Credential")
        };
        cred
    }

    /// A versionless self-addressing record.
    pub fn make_record(&self, note: &str) -> Sad {
        let mut map = Map::new();
        map.insert("d".to_string(), json!(""));
        map.insert("issuer".to_string(), json!(self.aid()));
        map.insert("note".to_string(), json!(note));
        Sad::from_map(map).expect("record builds")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => unreachable!("fixture documents are objects"),
    }
}

fn expect_event(sad: Sad) -> Event {
    let Message::Event(event) = dispatch(sad) else {
        unreachable!("event protocol dispatches to Event")
    };
    event
}
