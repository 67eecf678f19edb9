//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Kind (1) │ Len (4)  │     Payload (bincode)       │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Request Kinds
//! - 0x01: GET_TRAINER    - Payload: id
//! - 0x02: DELETE_TRAINER - Payload: id
//! - 0x03: UPDATE_TRAINER - Payload: UpdateTrainer
//! - 0x04: CREATE_TRAINER - Payload: NewTrainer (one item of a create stream)
//! - 0x05: CREATE_END     - Payload: empty (closes a create stream)
//! - 0x06: LIST_TRAINERS  - Payload: name fragment
//! - 0x07: PING           - Payload: empty
//!
//! ### Response Kinds
//! - 0x00: OK             - Payload: Reply
//! - 0x10: ITEM           - Payload: Trainer (one item of a list stream)
//! - 0x11: END_OF_STREAM  - Payload: empty
//! - 0x20: ERROR          - Payload: code + message
//!
//! ### Streaming Shapes
//! - Create: any number of CREATE_TRAINER, then CREATE_END; one OK(Created) back
//! - List: one LIST_TRAINERS; ITEM frames back, then END_OF_STREAM

mod codec;
mod request;
mod response;

pub use codec::{
    decode_request, decode_response, encode_request, encode_response, read_request,
    read_response, write_request, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
pub use request::{Request, RequestKind};
pub use response::{ErrorCode, Reply, Response, ResponseKind};
