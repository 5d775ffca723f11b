//! Raw bindings to the TagLib bridge in `bridge/audiotags_bridge.h`.
//!
//! Nothing here is safe to call without reading the header: sink callbacks
//! receive buffers that are only valid for the duration of the call.

#![allow(
    non_upper_case_globals,
    non_camel_case_types,
    non_snake_case,
    dead_code
)]

include!(concat!(env!("OUT_DIR"), "/bindings.rs"));
