//! # Interpreter
//!
//! The execution loop. Exceptional halts consume all remaining gas; REVERT
//! returns its payload and refunds what was left.

use crate::context::{ExecutionContext, MAX_CALL_DEPTH};
use crate::errors::VmError;
use crate::gas;
use crate::host::{Host, LogEntry};
use crate::memory::{expansion_gas, words_for, Memory};
use crate::opcodes as op;
use crate::stack::Stack;
use primitive_types::{U256, U512};
use sha3::{Digest, Keccak256};
use shared_types::{Address, Hash};
use std::collections::HashSet;

/// Hard ceiling on interpreter steps per frame.
const MAX_EXECUTION_STEPS: u64 = 10_000_000;

/// Outcome of a contract execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// True when the frame ran to STOP/RETURN.
    pub success: bool,
    /// RETURN or REVERT payload.
    pub return_data: Vec<u8>,
    /// Gas consumed by the frame.
    pub gas_used: u64,
    /// The halting error, if any.
    pub error: Option<VmError>,
}

impl ExecutionResult {
    fn failure(error: VmError, gas_limit: u64) -> Self {
        Self {
            success: false,
            return_data: Vec::new(),
            gas_used: gas_limit,
            error: Some(error),
        }
    }
}

/// Execute contract code against a host.
///
/// Determinism: repeated runs with identical `(host, context, code, input,
/// gas_limit)` produce identical results; the interpreter itself never
/// consults a clock or RNG.
pub fn execute_contract<H: Host>(
    host: &mut H,
    context: &ExecutionContext,
    code: &[u8],
    input: &[u8],
    gas_limit: u64,
) -> ExecutionResult {
    if context.depth >= MAX_CALL_DEPTH {
        return ExecutionResult::failure(VmError::CallDepthExceeded(context.depth), gas_limit);
    }

    let mut frame = Frame {
        host,
        context,
        code,
        input,
        pc: 0,
        stack: Stack::new(),
        memory: Memory::new(),
        gas_limit,
        gas_remaining: gas_limit,
        jump_dests: analyze_jump_dests(code),
        halt: None,
    };

    match frame.run() {
        Ok(()) => {
            let gas_used = gas_limit - frame.gas_remaining;
            match frame.halt.unwrap_or(Halt::Stop) {
                Halt::Stop => ExecutionResult {
                    success: true,
                    return_data: Vec::new(),
                    gas_used,
                    error: None,
                },
                Halt::Return(data) => ExecutionResult {
                    success: true,
                    return_data: data,
                    gas_used,
                    error: None,
                },
                Halt::Revert(data) => ExecutionResult {
                    success: false,
                    return_data: data,
                    gas_used,
                    error: None,
                },
            }
        }
        Err(error) => ExecutionResult::failure(error, gas_limit),
    }
}

enum Halt {
    Stop,
    Return(Vec<u8>),
    Revert(Vec<u8>),
}

struct Frame<'a, H: Host> {
    host: &'a mut H,
    context: &'a ExecutionContext,
    code: &'a [u8],
    input: &'a [u8],
    pc: usize,
    stack: Stack,
    memory: Memory,
    gas_limit: u64,
    gas_remaining: u64,
    jump_dests: HashSet<usize>,
    halt: Option<Halt>,
}

impl<H: Host> Frame<'_, H> {
    fn run(&mut self) -> Result<(), VmError> {
        let mut steps = 0u64;
        while self.halt.is_none() && self.pc < self.code.len() {
            steps += 1;
            if steps > MAX_EXECUTION_STEPS {
                return Err(VmError::OutOfGas);
            }

            let opcode = self.code[self.pc];
            if !op::is_supported(opcode) {
                return Err(VmError::InvalidOpcode(opcode));
            }
            self.consume_gas(gas::base_cost(opcode))?;
            self.step(opcode)?;
        }
        Ok(())
    }

    fn consume_gas(&mut self, amount: u64) -> Result<(), VmError> {
        if amount > self.gas_remaining {
            self.gas_remaining = 0;
            return Err(VmError::OutOfGas);
        }
        self.gas_remaining -= amount;
        Ok(())
    }

    /// Charge expansion gas and grow memory to cover `[offset, offset+size)`.
    fn charge_memory(&mut self, offset: usize, size: usize) -> Result<(), VmError> {
        if size == 0 {
            return Ok(());
        }
        let end = offset
            .checked_add(size)
            .ok_or(VmError::MemoryOutOfBounds { offset, size })?;
        let cost = expansion_gas(self.memory.word_count(), words_for(end));
        self.consume_gas(cost)?;
        self.memory.ensure(offset, size)?;
        Ok(())
    }

    fn require_mutable(&self) -> Result<(), VmError> {
        if self.context.is_static {
            return Err(VmError::WriteInStaticContext);
        }
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn step(&mut self, opcode: u8) -> Result<(), VmError> {
        self.pc += 1;

        match opcode {
            // =================================================================
            // STOP & ARITHMETIC
            // =================================================================
            op::STOP => {
                self.halt = Some(Halt::Stop);
            }
            op::ADD => self.binary_op(|a, b| a.overflowing_add(b).0)?,
            op::MUL => self.binary_op(|a, b| a.overflowing_mul(b).0)?,
            op::SUB => self.binary_op(|a, b| a.overflowing_sub(b).0)?,
            op::DIV => self.binary_op(|a, b| if b.is_zero() { U256::zero() } else { a / b })?,
            op::SDIV => self.binary_op(signed_div)?,
            op::MOD => self.binary_op(|a, b| if b.is_zero() { U256::zero() } else { a % b })?,
            op::SMOD => self.binary_op(signed_mod)?,
            op::ADDMOD => {
                let (a, b, n) = self.stack.pop_triple()?;
                let result = if n.is_zero() {
                    U256::zero()
                } else {
                    u512_to_u256((u256_to_u512(a) + u256_to_u512(b)) % u256_to_u512(n))
                };
                self.stack.push(result)?;
            }
            op::MULMOD => {
                let (a, b, n) = self.stack.pop_triple()?;
                let result = if n.is_zero() {
                    U256::zero()
                } else {
                    u512_to_u256((u256_to_u512(a) * u256_to_u512(b)) % u256_to_u512(n))
                };
                self.stack.push(result)?;
            }
            op::EXP => {
                let (base, exponent) = self.stack.pop_pair()?;
                self.consume_gas(gas::exp_dynamic_cost(exponent))?;
                self.stack.push(base.overflowing_pow(exponent).0)?;
            }

            // =================================================================
            // COMPARISON & BITWISE
            // =================================================================
            op::LT => self.binary_op(|a, b| bool_word(a < b))?,
            op::GT => self.binary_op(|a, b| bool_word(a > b))?,
            op::EQ => self.binary_op(|a, b| bool_word(a == b))?,
            op::ISZERO => {
                let a = self.stack.pop()?;
                self.stack.push(bool_word(a.is_zero()))?;
            }
            op::AND => self.binary_op(|a, b| a & b)?,
            op::OR => self.binary_op(|a, b| a | b)?,
            op::XOR => self.binary_op(|a, b| a ^ b)?,
            op::NOT => {
                let a = self.stack.pop()?;
                self.stack.push(!a)?;
            }
            op::BYTE => {
                let (index, word) = self.stack.pop_pair()?;
                let result = if index < U256::from(32) {
                    U256::from(word.byte(31 - index.as_usize()))
                } else {
                    U256::zero()
                };
                self.stack.push(result)?;
            }

            // =================================================================
            // HASHING
            // =================================================================
            op::SHA3 => {
                let offset = self.pop_usize()?;
                let size = self.pop_usize()?;
                self.consume_gas(gas::sha3_dynamic_cost(size))?;
                self.charge_memory(offset, size)?;
                let data = self.memory.load(offset, size);
                let digest: Hash = Keccak256::digest(&data).into();
                self.stack.push(U256::from_big_endian(&digest))?;
            }

            // =================================================================
            // CONTEXT
            // =================================================================
            op::ADDRESS => self.stack.push(address_to_word(&self.context.address))?,
            op::BALANCE => {
                let address = word_to_address(self.stack.pop()?);
                let balance = self.host.balance(&address);
                self.stack.push(balance)?;
            }
            op::CALLER => self.stack.push(address_to_word(&self.context.caller))?,
            op::CALLVALUE => self.stack.push(self.context.call_value)?,
            op::CALLDATALOAD => {
                let offset = self.pop_usize()?;
                let mut word = [0u8; 32];
                for (i, byte) in word.iter_mut().enumerate() {
                    if let Some(pos) = offset.checked_add(i) {
                        if pos < self.input.len() {
                            *byte = self.input[pos];
                        }
                    }
                }
                self.stack.push(U256::from_big_endian(&word))?;
            }
            op::CALLDATASIZE => self.stack.push(U256::from(self.input.len()))?,
            op::TIMESTAMP => self.stack.push(U256::from(self.context.timestamp))?,
            op::NUMBER => self.stack.push(U256::from(self.context.block_number))?,
            op::CHAINID => self.stack.push(U256::from(self.context.chain_id))?,

            // =================================================================
            // MEMORY & STORAGE
            // =================================================================
            op::MLOAD => {
                let offset = self.pop_usize()?;
                self.charge_memory(offset, 32)?;
                let word = self.memory.load_word(offset);
                self.stack.push(U256::from_big_endian(&word))?;
            }
            op::MSTORE => {
                let offset = self.pop_usize()?;
                let value = self.stack.pop()?;
                self.charge_memory(offset, 32)?;
                let mut word = [0u8; 32];
                value.to_big_endian(&mut word);
                self.memory.store_word(offset, &word)?;
            }
            op::MSTORE8 => {
                let offset = self.pop_usize()?;
                let value = self.stack.pop()?;
                self.charge_memory(offset, 1)?;
                self.memory.store_byte(offset, value.byte(0))?;
            }
            op::SLOAD => {
                let key = u256_to_hash(self.stack.pop()?);
                let value = self.host.sload(&self.context.address, &key);
                self.stack.push(U256::from_big_endian(&value))?;
            }
            op::SSTORE => {
                self.require_mutable()?;
                let key = u256_to_hash(self.stack.pop()?);
                let value = u256_to_hash(self.stack.pop()?);
                self.host.sstore(&self.context.address, key, value);
            }

            // =================================================================
            // FLOW
            // =================================================================
            op::JUMP => {
                let target = self.pop_usize()?;
                if !self.jump_dests.contains(&target) {
                    return Err(VmError::BadJump(target));
                }
                self.pc = target;
            }
            op::JUMPI => {
                let target = self.pop_usize()?;
                let condition = self.stack.pop()?;
                if !condition.is_zero() {
                    if !self.jump_dests.contains(&target) {
                        return Err(VmError::BadJump(target));
                    }
                    self.pc = target;
                }
            }
            op::JUMPDEST => {}
            op::RETURN => {
                let offset = self.pop_usize()?;
                let size = self.pop_usize()?;
                self.charge_memory(offset, size)?;
                self.halt = Some(Halt::Return(self.memory.load(offset, size)));
            }
            op::REVERT => {
                let offset = self.pop_usize()?;
                let size = self.pop_usize()?;
                self.charge_memory(offset, size)?;
                self.halt = Some(Halt::Revert(self.memory.load(offset, size)));
            }

            // =================================================================
            // PUSH / DUP / SWAP / LOG
            // =================================================================
            op::PUSH0 => self.stack.push(U256::zero())?,
            _ if op::push_data_len(opcode) > 0 => {
                let len = op::push_data_len(opcode);
                let end = (self.pc + len).min(self.code.len());
                let mut word = [0u8; 32];
                let data = &self.code[self.pc..end];
                word[32 - len..32 - len + data.len()].copy_from_slice(data);
                self.stack.push(U256::from_big_endian(&word))?;
                self.pc += len;
            }
            _ if op::is_dup(opcode) => self.stack.dup((opcode - op::DUP1 + 1) as usize)?,
            _ if op::is_swap(opcode) => self.stack.swap((opcode - op::SWAP1 + 1) as usize)?,
            _ if op::is_log(opcode) => {
                self.require_mutable()?;
                let offset = self.pop_usize()?;
                let size = self.pop_usize()?;
                let topic_count = (opcode - op::LOG0) as usize;
                let mut topics = Vec::with_capacity(topic_count);
                for _ in 0..topic_count {
                    topics.push(u256_to_hash(self.stack.pop()?));
                }
                self.consume_gas(gas::log_dynamic_cost(size))?;
                self.charge_memory(offset, size)?;
                let data = self.memory.load(offset, size);
                self.host.log(LogEntry {
                    address: self.context.address,
                    topics,
                    data,
                });
            }

            // =================================================================
            // CALLS & CREATION
            // =================================================================
            op::CREATE => self.do_create(false)?,
            op::CREATE2 => self.do_create(true)?,
            op::CALL => self.do_call(CallKind::Call)?,
            op::CALLCODE => self.do_call(CallKind::CallCode)?,
            op::DELEGATECALL => self.do_call(CallKind::DelegateCall)?,
            op::STATICCALL => self.do_call(CallKind::StaticCall)?,
            op::SELFDESTRUCT => {
                self.require_mutable()?;
                let beneficiary = word_to_address(self.stack.pop()?);
                self.host.selfdestruct(&self.context.address, &beneficiary);
                self.halt = Some(Halt::Stop);
            }

            other => return Err(VmError::InvalidOpcode(other)),
        }

        Ok(())
    }

    fn binary_op(&mut self, f: impl FnOnce(U256, U256) -> U256) -> Result<(), VmError> {
        let (a, b) = self.stack.pop_pair()?;
        self.stack.push(f(a, b))
    }

    fn pop_usize(&mut self) -> Result<usize, VmError> {
        let value = self.stack.pop()?;
        if value > U256::from(u32::MAX) {
            return Err(VmError::MemoryOutOfBounds {
                offset: usize::MAX,
                size: 0,
            });
        }
        Ok(value.as_usize())
    }

    fn do_create(&mut self, with_salt: bool) -> Result<(), VmError> {
        self.require_mutable()?;
        let value = self.stack.pop()?;
        let offset = self.pop_usize()?;
        let size = self.pop_usize()?;
        let salt = if with_salt {
            Some(u256_to_hash(self.stack.pop()?))
        } else {
            None
        };

        if with_salt {
            self.consume_gas(gas::costs::CREATE2_WORD * (size.div_ceil(32) as u64))?;
        }
        self.charge_memory(offset, size)?;
        let init_code = self.memory.load(offset, size);

        let creator = self.context.address;
        let new_address = match salt {
            Some(salt) => create2_address(&creator, &salt, &init_code),
            None => create_address(&creator, self.host.nonce(&creator)),
        };
        self.host.increment_nonce(&creator);

        if !self.host.transfer(&creator, &new_address, value) {
            self.stack.push(U256::zero())?;
            return Ok(());
        }

        // Run the init code; its return data becomes the deployed code.
        let child_context = self
            .context
            .child(new_address, creator, value, false);
        let child_gas = self.gas_remaining;
        let result = execute_contract(self.host, &child_context, &init_code, &[], child_gas);
        self.consume_gas(result.gas_used.min(child_gas))?;

        if result.success {
            self.host.set_code(&new_address, result.return_data);
            self.stack.push(address_to_word(&new_address))?;
        } else {
            self.stack.push(U256::zero())?;
        }
        Ok(())
    }

    fn do_call(&mut self, kind: CallKind) -> Result<(), VmError> {
        let gas_requested = self.stack.pop()?;
        let target = word_to_address(self.stack.pop()?);
        let value = match kind {
            CallKind::Call | CallKind::CallCode => self.stack.pop()?,
            CallKind::DelegateCall | CallKind::StaticCall => U256::zero(),
        };
        let in_offset = self.pop_usize()?;
        let in_size = self.pop_usize()?;
        let out_offset = self.pop_usize()?;
        let out_size = self.pop_usize()?;

        if !value.is_zero() {
            self.require_mutable()?;
            self.consume_gas(gas::costs::CALL_VALUE)?;
        }

        self.charge_memory(in_offset, in_size)?;
        self.charge_memory(out_offset, out_size)?;
        let call_input = self.memory.load(in_offset, in_size);

        // Value moves only for plain CALL; CALLCODE runs foreign code on
        // the caller's own balance and storage.
        if kind == CallKind::Call && !self.host.transfer(&self.context.address, &target, value) {
            self.stack.push(U256::zero())?;
            return Ok(());
        }

        let child_context = match kind {
            CallKind::Call => self.context.child(target, self.context.address, value, false),
            CallKind::CallCode => {
                self.context
                    .child(self.context.address, self.context.address, value, false)
            }
            CallKind::DelegateCall => self.context.child(
                self.context.address,
                self.context.caller,
                self.context.call_value,
                false,
            ),
            CallKind::StaticCall => {
                self.context
                    .child(target, self.context.address, U256::zero(), true)
            }
        };

        let code = self.host.code(&target);
        let gas_cap = if gas_requested > U256::from(u64::MAX) {
            self.gas_remaining
        } else {
            gas_requested.as_u64().min(self.gas_remaining)
        };

        let result = execute_contract(self.host, &child_context, &code, &call_input, gas_cap);
        self.consume_gas(result.gas_used.min(gas_cap))?;

        let copy_len = result.return_data.len().min(out_size);
        if copy_len > 0 {
            self.memory
                .store(out_offset, &result.return_data[..copy_len])?;
        }
        self.stack.push(bool_word(result.success))?;
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
}

/// Scan code for JUMPDEST positions, skipping PUSH immediates.
fn analyze_jump_dests(code: &[u8]) -> HashSet<usize> {
    let mut dests = HashSet::new();
    let mut i = 0;
    while i < code.len() {
        let opcode = code[i];
        if opcode == op::JUMPDEST {
            dests.insert(i);
        }
        i += 1 + op::push_data_len(opcode);
    }
    dests
}

fn bool_word(flag: bool) -> U256 {
    if flag {
        U256::one()
    } else {
        U256::zero()
    }
}

fn u256_to_u512(value: U256) -> U512 {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    U512::from_big_endian(&bytes)
}

fn u512_to_u256(value: U512) -> U256 {
    let mut bytes = [0u8; 64];
    value.to_big_endian(&mut bytes);
    U256::from_big_endian(&bytes[32..])
}

fn signed_div(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let a_neg = a.bit(255);
    let b_neg = b.bit(255);
    let a_abs = if a_neg { twos_complement(a) } else { a };
    let b_abs = if b_neg { twos_complement(b) } else { b };
    let result = a_abs / b_abs;
    if a_neg == b_neg {
        result
    } else {
        twos_complement(result)
    }
}

fn signed_mod(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let a_neg = a.bit(255);
    let a_abs = if a_neg { twos_complement(a) } else { a };
    let b_abs = if b.bit(255) { twos_complement(b) } else { b };
    let result = a_abs % b_abs;
    if a_neg {
        twos_complement(result)
    } else {
        result
    }
}

fn twos_complement(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

fn u256_to_hash(value: U256) -> Hash {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    bytes
}

fn address_to_word(address: &Address) -> U256 {
    let mut bytes = [0u8; 32];
    bytes[12..].copy_from_slice(address.as_bytes());
    U256::from_big_endian(&bytes)
}

fn word_to_address(value: U256) -> Address {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    let mut address = [0u8; 20];
    address.copy_from_slice(&bytes[12..]);
    Address::new(address)
}

/// CREATE address: low 20 bytes of `keccak(creator || nonce_le)`.
fn create_address(creator: &Address, nonce: u64) -> Address {
    let mut hasher = Keccak256::new();
    hasher.update(creator.as_bytes());
    hasher.update(nonce.to_le_bytes());
    let digest: Hash = hasher.finalize().into();
    word_to_address(U256::from_big_endian(&digest))
}

/// CREATE2 address: low 20 bytes of
/// `keccak(0xff || creator || salt || keccak(init_code))`.
fn create2_address(creator: &Address, salt: &Hash, init_code: &[u8]) -> Address {
    let code_hash: Hash = Keccak256::digest(init_code).into();
    let mut hasher = Keccak256::new();
    hasher.update([0xFFu8]);
    hasher.update(creator.as_bytes());
    hasher.update(salt);
    hasher.update(code_hash);
    let digest: Hash = hasher.finalize().into();
    word_to_address(U256::from_big_endian(&digest))
}

// =============================================================================
// TESTS
// =============================================================================
