//! The frame catalog: the JSON shapes exchanged between client and server,
//! tagged by a `type` string with the rest of the frame under `payload`.

use groupchat_core::GroupMember;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserEvent {
    #[serde(rename = "USER_JOINED")]
    Joined,
    #[serde(rename = "USER_DISCONNECTED")]
    Disconnected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinPayload {
    pub username: String,
    #[serde(rename = "publicKey")]
    pub public_key: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendGroupMessagePayload {
    pub ciphertext: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntermediateValuePayload {
    #[serde(rename = "intermediateValue")]
    pub intermediate_value: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserNotificationPayload {
    pub event: UserEvent,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMembersListPayload {
    pub members: Vec<GroupMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRound1Payload {
    #[serde(rename = "groupSize")]
    pub group_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntermediateValueEntry {
    pub username: String,
    #[serde(rename = "intermediateValue")]
    pub intermediate_value: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRound2Payload {
    #[serde(rename = "intermediateValues")]
    pub intermediate_values: Vec<IntermediateValueEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndividualKeyResetPayload {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastGroupMessagePayload {
    pub sender: String,
    pub ciphertext: String,
}

/// Frames sent by a participant to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientFrame {
    #[serde(rename = "C2S_AUTHENTICATE_AND_JOIN")]
    AuthenticateAndJoin(JoinPayload),
    #[serde(rename = "C2S_SEND_GROUP_MESSAGE")]
    SendGroupMessage(SendGroupMessagePayload),
    #[serde(rename = "C2S_INTERMEDIATE_VALUE")]
    IntermediateValue(IntermediateValuePayload),
    #[serde(rename = "C2S_ROUND2_COMPLETED")]
    Round2Completed,
}

/// Frames sent by the server to a participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerFrame {
    #[serde(rename = "S2C_USER_NOTIFICATION")]
    UserNotification(UserNotificationPayload),
    #[serde(rename = "S2C_GROUP_MEMBERS_LIST")]
    GroupMembersList(GroupMembersListPayload),
    #[serde(rename = "S2C_START_KEY_EXCHANGE_ROUND1")]
    StartKeyExchangeRound1(StartRound1Payload),
    #[serde(rename = "S2C_START_KEY_EXCHANGE_ROUND2")]
    StartKeyExchangeRound2(StartRound2Payload),
    #[serde(rename = "S2C_KEY_EXCHANGE_COMPLETED")]
    KeyExchangeCompleted,
    #[serde(rename = "S2C_INDIVIDUAL_KEY_RESET")]
    IndividualKeyReset(IndividualKeyResetPayload),
    #[serde(rename = "S2C_BROADCAST_GROUP_MESSAGE")]
    BroadcastGroupMessage(BroadcastGroupMessagePayload),
}

impl ClientFrame {
    pub fn to_json_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("ClientFrame always serializes")
    }
}

impl ServerFrame {
    pub fn to_json_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("ServerFrame always serializes")
    }
}
