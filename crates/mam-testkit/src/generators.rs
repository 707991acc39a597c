//! Proptest generators for property-based testing.

use proptest::prelude::*;

use mam_core::{
    encode_str, ChannelState, Mode, Root, SecurityLevel, Seed, SideKey, Trytes,
};

/// Generate a seed of 1 to 81 trytes.
pub fn seed() -> impl Strategy<Value = Seed> {
    "[9A-Z]{1,81}".prop_map(|s| Seed::new(s).expect("seed regex"))
}

/// Generate a side key, mixed case as users type them.
pub fn side_key_text() -> impl Strategy<Value = String> {
    "[9A-Za-z]{1,81}".prop_map(String::from)
}

pub fn side_key() -> impl Strategy<Value = SideKey> {
    side_key_text().prop_map(|s| SideKey::new(&s).expect("side key regex"))
}

/// Generate a random Root.
pub fn root() -> impl Strategy<Value = Root> {
    any::<[u8; 32]>().prop_map(Root::from_bytes)
}

pub fn security_level() -> impl Strategy<Value = SecurityLevel> {
    prop_oneof![
        Just(SecurityLevel::Low),
        Just(SecurityLevel::Medium),
        Just(SecurityLevel::High),
    ]
}

pub fn mode() -> impl Strategy<Value = Mode> {
    prop_oneof![Just(Mode::Public), Just(Mode::Private), Just(Mode::Restricted)]
}

/// Generate a payload: arbitrary text packed into trytes.
pub fn payload(max_chars: usize) -> impl Strategy<Value = Trytes> {
    prop::collection::vec(any::<char>(), 0..=max_chars)
        .prop_map(|chars| encode_str(&chars.into_iter().collect::<String>()))
}

/// Parameters for setting up a channel.
#[derive(Debug, Clone)]
pub struct ChannelParams {
    pub seed: Seed,
    pub security: SecurityLevel,
    pub mode: Mode,
    pub side_key: String,
    pub position: u64,
}

impl Arbitrary for ChannelParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (seed(), security_level(), mode(), side_key_text(), 0u64..16)
            .prop_map(|(seed, security, mode, side_key, position)| ChannelParams {
                seed,
                security,
                mode,
                side_key,
                position,
            })
            .boxed()
    }
}

/// Build the channel described by `params`, replayed to its position.
pub fn state_from_params(params: &ChannelParams) -> ChannelState {
    let side_key = (params.mode == Mode::Restricted).then_some(params.side_key.as_str());
    ChannelState::new(params.seed.clone(), params.security)
        .change_mode(params.mode, side_key)
        .expect("generated channel params")
        .replay(params.position)
        .expect("generated position")
}
