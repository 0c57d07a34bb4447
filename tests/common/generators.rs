//! Per-instruction program generators.
//!
//! Every generated case loads its operands from `mngr2proc`, runs the
//! instruction under test and sends the result to `proc2mngr`, so the sink
//! checks each value as it is produced. Cases use x1..x3 only and can be
//! chained with [`Program::then`].

use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg32;

use super::Program;
use super::encode::{addi, bne, lw, sw};

pub type RrInst = fn(u8, u8, u8) -> u32;
pub type RimmInst = fn(u8, u8, i32) -> u32;

pub fn rng(seed: u64) -> Pcg32 {
    Pcg32::seed_from_u64(seed)
}

pub fn random_word(rng: &mut Pcg32) -> u32 {
    rng.next_u32()
}

/// Random 12-bit signed immediate.
pub fn random_imm(rng: &mut Pcg32) -> i32 {
    rng.gen_range(-2048..2048)
}

// ----------------------------------------------------------------------------
// register-register
// ----------------------------------------------------------------------------

/// Result consumed `nops` instructions after it is produced.
pub fn rr_dest_dep(inst: RrInst, nops: usize, src0: u32, src1: u32, result: u32) -> Program {
    Program::new()
        .recv(1, src0)
        .recv(2, src1)
        .inst(inst(3, 1, 2))
        .nops(nops)
        .send(3, result)
}

/// `nops0` instructions between the src0 load and the src1 load, `nops1`
/// between the src1 load and the instruction.
pub fn rr_src01(inst: RrInst, nops0: usize, nops1: usize, src0: u32, src1: u32, result: u32) -> Program {
    Program::new()
        .recv(1, src0)
        .nops(nops0)
        .recv(2, src1)
        .nops(nops1)
        .inst(inst(3, 1, 2))
        .send(3, result)
}

/// `nops` instructions between the src0 load and the instruction.
pub fn rr_src0_dep(inst: RrInst, nops: usize, src0: u32, src1: u32, result: u32) -> Program {
    Program::new()
        .recv(2, src1)
        .recv(1, src0)
        .nops(nops)
        .inst(inst(3, 1, 2))
        .send(3, result)
}

pub fn rr_src1_dep(inst: RrInst, nops: usize, src0: u32, src1: u32, result: u32) -> Program {
    rr_src01(inst, 0, nops, src0, src1, result)
}

pub fn rr_srcs_dep(inst: RrInst, nops: usize, src0: u32, src1: u32, result: u32) -> Program {
    rr_src01(inst, nops, nops, src0, src1, result)
}

pub fn rr_src0_eq_dest(inst: RrInst, src0: u32, src1: u32, result: u32) -> Program {
    Program::new()
        .recv(1, src0)
        .recv(2, src1)
        .inst(inst(1, 1, 2))
        .send(1, result)
}

pub fn rr_src1_eq_dest(inst: RrInst, src0: u32, src1: u32, result: u32) -> Program {
    Program::new()
        .recv(1, src0)
        .recv(2, src1)
        .inst(inst(2, 1, 2))
        .send(2, result)
}

pub fn rr_srcs_eq_dest(inst: RrInst, src: u32, result: u32) -> Program {
    Program::new().recv(1, src).inst(inst(1, 1, 1)).send(1, result)
}

pub fn rr_value(inst: RrInst, src0: u32, src1: u32, result: u32) -> Program {
    rr_dest_dep(inst, 0, src0, src1, result)
}

/// Every dependency shape of one instruction at 0..=`max_nops` nops.
pub fn rr_dependency_suite(inst: RrInst, max_nops: usize, src0: u32, src1: u32, result: u32) -> Program {
    let mut program = Program::new();
    for nops in 0..=max_nops {
        program = program
            .then(rr_dest_dep(inst, nops, src0, src1, result))
            .then(rr_src0_dep(inst, nops, src0, src1, result))
            .then(rr_src1_dep(inst, nops, src0, src1, result))
            .then(rr_srcs_dep(inst, nops, src0, src1, result));
    }
    program
        .then(rr_src0_eq_dest(inst, src0, src1, result))
        .then(rr_src1_eq_dest(inst, src0, src1, result))
}

/// `count` random operand pairs checked against `model`.
pub fn rr_random(inst: RrInst, model: fn(u32, u32) -> u32, seed: u64, count: usize) -> Program {
    let mut rng = rng(seed);
    let mut program = Program::new();
    for _ in 0..count {
        let src0 = random_word(&mut rng);
        let src1 = random_word(&mut rng);
        program = program.then(rr_value(inst, src0, src1, model(src0, src1)));
    }
    program
}

// ----------------------------------------------------------------------------
// register-immediate
// ----------------------------------------------------------------------------

pub fn rimm_dest_dep(inst: RimmInst, nops: usize, src: u32, imm: i32, result: u32) -> Program {
    Program::new()
        .recv(1, src)
        .inst(inst(3, 1, imm))
        .nops(nops)
        .send(3, result)
}

pub fn rimm_src_dep(inst: RimmInst, nops: usize, src: u32, imm: i32, result: u32) -> Program {
    Program::new()
        .recv(1, src)
        .nops(nops)
        .inst(inst(3, 1, imm))
        .send(3, result)
}

pub fn rimm_src_eq_dest(inst: RimmInst, src: u32, imm: i32, result: u32) -> Program {
    Program::new().recv(1, src).inst(inst(1, 1, imm)).send(1, result)
}

pub fn rimm_value(inst: RimmInst, src: u32, imm: i32, result: u32) -> Program {
    rimm_dest_dep(inst, 0, src, imm, result)
}

pub fn rimm_random(inst: RimmInst, model: fn(u32, i32) -> u32, seed: u64, count: usize) -> Program {
    let mut rng = rng(seed);
    let mut program = Program::new();
    for _ in 0..count {
        let src = random_word(&mut rng);
        let imm = random_imm(&mut rng);
        program = program.then(rimm_value(inst, src, imm, model(src, imm)));
    }
    program
}

// ----------------------------------------------------------------------------
// memory
// ----------------------------------------------------------------------------

/// `lw` whose result is consumed `nops` instructions later.
pub fn ld_dest_dep(nops: usize, base: u32, offset: i32, result: u32) -> Program {
    Program::new()
        .recv(1, base)
        .inst(lw(3, 1, offset))
        .nops(nops)
        .send(3, result)
}

/// `lw` whose base register is written `nops` instructions earlier.
pub fn ld_src_dep(nops: usize, base: u32, offset: i32, result: u32) -> Program {
    Program::new()
        .recv(1, base)
        .nops(nops)
        .inst(lw(3, 1, offset))
        .send(3, result)
}

/// `sw` followed by a `lw` of the same word.
pub fn st_then_ld(nops: usize, base: u32, offset: i32, value: u32) -> Program {
    Program::new()
        .recv(1, base)
        .recv(2, value)
        .nops(nops)
        .inst(sw(2, 1, offset))
        .nops(nops)
        .inst(lw(3, 1, offset))
        .send(3, value)
        .expect_mem(base.wrapping_add(offset as u32), value)
}

// ----------------------------------------------------------------------------
// branch
// ----------------------------------------------------------------------------

/// `bne` over one marker instruction. x3 ends up 1 iff the branch fell through.
pub fn br_template(nops0: usize, nops1: usize, src0: u32, src1: u32) -> Program {
    let taken = src0 != src1;
    Program::new()
        .inst(addi(3, 0, 0))
        .recv(1, src0)
        .nops(nops0)
        .recv(2, src1)
        .nops(nops1)
        .inst(bne(1, 2, 8))
        .inst(addi(3, 3, 1))
        .send(3, u32::from(!taken))
}

/// `bne x1, x1` over one marker instruction; never taken, so x3 ends up 1.
pub fn br_src0_eq_src1(nops: usize, src: u32) -> Program {
    Program::new()
        .inst(addi(3, 0, 0))
        .recv(1, src)
        .nops(nops)
        .inst(bne(1, 1, 8))
        .inst(addi(3, 3, 1))
        .send(3, 1)
}
