//! # Gas Metering
//!
//! Fixed integer base cost per opcode, plus dynamic components for memory
//! expansion, EXP exponent bytes, SHA3 input words and LOG payloads.

use crate::opcodes;
use primitive_types::U256;

/// Gas costs for common operations.
pub mod costs {
    /// Cheapest context reads (ADDRESS, CALLER, ...).
    pub const BASE: u64 = 2;
    /// Arithmetic and stack shuffling.
    pub const VERY_LOW: u64 = 3;
    /// Multiplication-class arithmetic.
    pub const LOW: u64 = 5;
    /// Modular arithmetic over 512-bit intermediates.
    pub const MID: u64 = 8;
    /// Conditional jump.
    pub const HIGH: u64 = 10;
    /// JUMPDEST marker.
    pub const JUMPDEST: u64 = 1;
    /// Account balance lookup.
    pub const BALANCE: u64 = 100;
    /// Storage read.
    pub const SLOAD: u64 = 100;
    /// Storage write.
    pub const SSTORE: u64 = 5000;
    /// SHA3 base.
    pub const SHA3: u64 = 30;
    /// SHA3 per input word.
    pub const SHA3_WORD: u64 = 6;
    /// EXP base.
    pub const EXP: u64 = 10;
    /// EXP per byte of exponent.
    pub const EXP_BYTE: u64 = 50;
    /// LOG base.
    pub const LOG: u64 = 375;
    /// LOG per topic.
    pub const LOG_TOPIC: u64 = 375;
    /// LOG per byte of payload.
    pub const LOG_DATA: u64 = 8;
    /// Call-family base.
    pub const CALL: u64 = 100;
    /// Surcharge when a call transfers value.
    pub const CALL_VALUE: u64 = 9000;
    /// Contract creation.
    pub const CREATE: u64 = 32_000;
    /// CREATE2 per word of init code (hashing surcharge).
    pub const CREATE2_WORD: u64 = 6;
    /// SELFDESTRUCT.
    pub const SELFDESTRUCT: u64 = 5000;
}

/// Fixed base gas for an opcode. Dynamic parts are charged separately by
/// the interpreter.
#[must_use]
pub fn base_cost(op: u8) -> u64 {
    use opcodes as op_;
    match op {
        op_::STOP | op_::RETURN | op_::REVERT => 0,
        op_::JUMPDEST => costs::JUMPDEST,
        op_::ADD | op_::SUB => costs::VERY_LOW,
        op_::MUL | op_::DIV | op_::SDIV | op_::MOD | op_::SMOD => costs::LOW,
        op_::ADDMOD | op_::MULMOD => costs::MID,
        op_::EXP => costs::EXP,
        op_::LT | op_::GT | op_::EQ | op_::ISZERO | op_::AND | op_::OR | op_::XOR | op_::NOT
        | op_::BYTE => costs::VERY_LOW,
        op_::SHA3 => costs::SHA3,
        op_::ADDRESS | op_::CALLER | op_::CALLVALUE | op_::TIMESTAMP | op_::NUMBER
        | op_::CHAINID | op_::CALLDATASIZE => costs::BASE,
        op_::CALLDATALOAD => costs::VERY_LOW,
        op_::BALANCE => costs::BALANCE,
        op_::MLOAD | op_::MSTORE | op_::MSTORE8 => costs::VERY_LOW,
        op_::SLOAD => costs::SLOAD,
        op_::SSTORE => costs::SSTORE,
        op_::JUMP => costs::MID,
        op_::JUMPI => costs::HIGH,
        op_::PUSH0 => costs::BASE,
        op_::CREATE => costs::CREATE,
        op_::CREATE2 => costs::CREATE,
        op_::CALL | op_::CALLCODE | op_::DELEGATECALL | op_::STATICCALL => costs::CALL,
        op_::SELFDESTRUCT => costs::SELFDESTRUCT,
        _ if opcodes::push_data_len(op) > 0 => costs::VERY_LOW,
        _ if opcodes::is_dup(op) || opcodes::is_swap(op) => costs::VERY_LOW,
        _ if opcodes::is_log(op) => {
            let topics = u64::from(op - opcodes::LOG0);
            costs::LOG + costs::LOG_TOPIC * topics
        }
        _ => 0,
    }
}

/// Dynamic EXP cost: 50 gas per significant byte of the exponent.
#[must_use]
pub fn exp_dynamic_cost(exponent: U256) -> u64 {
    if exponent.is_zero() {
        return 0;
    }
    let significant_bytes = (exponent.bits() as u64).div_ceil(8);
    costs::EXP_BYTE * significant_bytes
}

/// Dynamic SHA3 cost: 6 gas per 32-byte input word.
#[must_use]
pub fn sha3_dynamic_cost(input_len: usize) -> u64 {
    costs::SHA3_WORD * (input_len.div_ceil(32) as u64)
}

/// Dynamic LOG cost: 8 gas per byte of payload.
#[must_use]
pub fn log_dynamic_cost(data_len: usize) -> u64 {
    costs::LOG_DATA * data_len as u64
}
