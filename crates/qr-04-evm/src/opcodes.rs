//! # Opcode Set
//!
//! The supported opcode subset as raw byte constants plus classification
//! helpers. Anything not listed here halts with `InvalidOpcode`.

#![allow(missing_docs)]

// Arithmetic
pub const STOP: u8 = 0x00;
pub const ADD: u8 = 0x01;
pub const MUL: u8 = 0x02;
pub const SUB: u8 = 0x03;
pub const DIV: u8 = 0x04;
pub const SDIV: u8 = 0x05;
pub const MOD: u8 = 0x06;
pub const SMOD: u8 = 0x07;
pub const ADDMOD: u8 = 0x08;
pub const MULMOD: u8 = 0x09;
pub const EXP: u8 = 0x0A;

// Comparison & bitwise
pub const LT: u8 = 0x10;
pub const GT: u8 = 0x11;
pub const EQ: u8 = 0x14;
pub const ISZERO: u8 = 0x15;
pub const AND: u8 = 0x16;
pub const OR: u8 = 0x17;
pub const XOR: u8 = 0x18;
pub const NOT: u8 = 0x19;
pub const BYTE: u8 = 0x1A;

// Hashing
pub const SHA3: u8 = 0x20;

// Context
pub const ADDRESS: u8 = 0x30;
pub const BALANCE: u8 = 0x31;
pub const CALLER: u8 = 0x33;
pub const CALLVALUE: u8 = 0x34;
pub const CALLDATALOAD: u8 = 0x35;
pub const CALLDATASIZE: u8 = 0x36;
pub const TIMESTAMP: u8 = 0x42;
pub const NUMBER: u8 = 0x43;
pub const CHAINID: u8 = 0x46;

// Memory & storage
pub const MLOAD: u8 = 0x51;
pub const MSTORE: u8 = 0x52;
pub const MSTORE8: u8 = 0x53;
pub const SLOAD: u8 = 0x54;
pub const SSTORE: u8 = 0x55;

// Flow
pub const JUMP: u8 = 0x56;
pub const JUMPI: u8 = 0x57;
pub const JUMPDEST: u8 = 0x5B;
pub const RETURN: u8 = 0xF3;
pub const REVERT: u8 = 0xFD;

// Pushes
pub const PUSH0: u8 = 0x5F;
pub const PUSH1: u8 = 0x60;
pub const PUSH32: u8 = 0x7F;

// Dup & swap
pub const DUP1: u8 = 0x80;
pub const DUP16: u8 = 0x8F;
pub const SWAP1: u8 = 0x90;
pub const SWAP16: u8 = 0x9F;

// Logs
pub const LOG0: u8 = 0xA0;
pub const LOG4: u8 = 0xA4;

// Calls & creation
pub const CREATE: u8 = 0xF0;
pub const CALL: u8 = 0xF1;
pub const CALLCODE: u8 = 0xF2;
pub const DELEGATECALL: u8 = 0xF4;
pub const CREATE2: u8 = 0xF5;
pub const STATICCALL: u8 = 0xFA;
pub const SELFDESTRUCT: u8 = 0xFF;

/// Number of immediate data bytes following a PUSH opcode (0 otherwise).
#[must_use]
pub fn push_data_len(op: u8) -> usize {
    if (PUSH1..=PUSH32).contains(&op) {
        (op - PUSH1 + 1) as usize
    } else {
        0
    }
}

/// True for DUP1..DUP16.
#[must_use]
pub fn is_dup(op: u8) -> bool {
    (DUP1..=DUP16).contains(&op)
}

/// True for SWAP1..SWAP16.
#[must_use]
pub fn is_swap(op: u8) -> bool {
    (SWAP1..=SWAP16).contains(&op)
}

/// True for LOG0..LOG4.
#[must_use]
pub fn is_log(op: u8) -> bool {
    (LOG0..=LOG4).contains(&op)
}

/// True if the opcode belongs to the supported subset.
#[must_use]
pub fn is_supported(op: u8) -> bool {
    matches!(
        op,
        STOP | ADD
            | MUL
            | SUB
            | DIV
            | SDIV
            | MOD
            | SMOD
            | ADDMOD
            | MULMOD
            | EXP
            | LT
            | GT
            | EQ
            | ISZERO
            | AND
            | OR
            | XOR
            | NOT
            | BYTE
            | SHA3
            | ADDRESS
            | BALANCE
            | CALLER
            | CALLVALUE
            | CALLDATALOAD
            | CALLDATASIZE
            | TIMESTAMP
            | NUMBER
            | CHAINID
            | MLOAD
            | MSTORE
            | MSTORE8
            | SLOAD
            | SSTORE
            | JUMP
            | JUMPI
            | JUMPDEST
            | RETURN
            | REVERT
            | CREATE
            | CALL
            | CALLCODE
            | DELEGATECALL
            | CREATE2
            | STATICCALL
            | SELFDESTRUCT
    ) || (PUSH0..=PUSH32).contains(&op)
        || is_dup(op)
        || is_swap(op)
        || is_log(op)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_data_len() {
        assert_eq!(push_data_len(PUSH0), 0);
        assert_eq!(push_data_len(PUSH1), 1);
        assert_eq!(push_data_len(PUSH32), 32);
        assert_eq!(push_data_len(ADD), 0);
    }

    #[test]
    fn test_ranges() {
        assert!(is_dup(DUP1));
        assert!(is_dup(DUP16));
        assert!(!is_dup(SWAP1));
        assert!(is_swap(SWAP16));
        assert!(is_log(LOG0));
        assert!(is_log(LOG4));
        assert!(!is_log(0xA5));
    }

    #[test]
    fn test_supported_subset() {
        assert!(is_supported(ADD));
        assert!(is_supported(PUSH0));
        assert!(is_supported(SELFDESTRUCT));
        assert!(!is_supported(0x0B));
        assert!(!is_supported(0xFE));
    }
}
