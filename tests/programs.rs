//! Whole programs, loaded from files and run through the library and
//! the `ls8` binary.

use ls8::{load_program, Cpu, LoadError};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

const PRINT8: &str = "\
# print8.ls8: print the number 8
10000010 # LDI R0,8
00000000
00001000
01000111 # PRN R0
00000000
00000001 # HLT
";

const MULT: &str = "\
10000010 # LDI R0,8
00000000
00001000
10000010 # LDI R1,9
00000001
00001001
10100010 # MUL R0,R1
00000000
00000001
01000111 # PRN R0
00000000
00000001 # HLT
";

// Prints 1, 4, 5 by taking both branches of JEQ and JNE.
const SCTEST: &str = "\
10000010 # LDI R0,10
00000000
00001010
10000010 # LDI R1,20
00000001
00010100
10000010 # LDI R2,TEST1
00000010
00010011
10100111 # CMP R0,R1
00000000
00000001
01010101 # JEQ R2
00000010
10000010 # LDI R3,1
00000011
00000001
01000111 # PRN R3
00000011
# TEST1 (address 19):
10000010 # LDI R2,TEST2
00000010
00100000
10100111 # CMP R0,R1
00000000
00000001
01010110 # JNE R2
00000010
10000010 # LDI R3,2
00000011
00000010
01000111 # PRN R3
00000011
# TEST2 (address 32):
10000010 # LDI R1,10
00000001
00001010
10000010 # LDI R2,TEST3
00000010
00110000
10100111 # CMP R0,R1
00000000
00000001
01010101 # JEQ R2
00000010
10000010 # LDI R3,3
00000011
00000011
01000111 # PRN R3
00000011
# TEST3 (address 48):
10000010 # LDI R3,4
00000011
00000100
01000111 # PRN R3
00000011
10000010 # LDI R2,TEST4
00000010
00111111
01010110 # JNE R2
00000010
10000010 # LDI R3,5
00000011
00000101
01000111 # PRN R3
00000011
# TEST4 (address 63):
00000001 # HLT
";

// Doubles R0 through a subroutine, pushing and popping a scratch value.
const CALL: &str = "\
10000010 # LDI R7,0xF4
00000111
11110100
10000010 # LDI R0,21
00000000
00010101
10000010 # LDI R1,DOUBLE
00000001
00010010
01010000 # CALL R1
00000001
01000111 # PRN R0
00000000
01000111 # PRN R2
00000010
00000001 # HLT
00000000
00000000
# DOUBLE (address 18):
10000010 # LDI R2,99
00000010
01100011
01000101 # PUSH R2
00000010
10100000 # ADD R0,R0
00000000
00000000
01000110 # POP R2
00000010
00010001 # RET
";

fn write_program(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    file.write_all(source.as_bytes()).expect("failed to write program");
    file
}

fn run_source(source: &str) -> (Cpu, String) {
    let file = write_program(source);
    let program = load_program(file.path()).unwrap();
    let mut cpu = Cpu::new();
    cpu.load_program(&program.bytes).unwrap();
    let mut out = Vec::new();
    cpu.run(&mut out).unwrap();
    (cpu, String::from_utf8(out).unwrap())
}

fn run_binary(path: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ls8"))
        .arg(path)
        .output()
        .expect("failed to run ls8")
}

#[test]
fn print8() {
    let (cpu, out) = run_source(PRINT8);
    assert_eq!(out, "8\n");
    assert!(cpu.is_halted());
}

#[test]
fn mult() {
    let (_, out) = run_source(MULT);
    assert_eq!(out, "72\n");
}

#[test]
fn conditional_jumps() {
    let (cpu, out) = run_source(SCTEST);
    assert_eq!(out, "1\n4\n5\n");
    assert_eq!(cpu.regs.sp(), 0);
}

#[test]
fn call_and_stack() {
    let (cpu, out) = run_source(CALL);
    assert_eq!(out, "42\n99\n");
    assert_eq!(cpu.regs.sp(), 0xF4);
}

#[test]
fn malformed_file_reports_line() {
    let file = write_program("10000010\n0000000z\n");
    assert_eq!(
        load_program(file.path()),
        Err(LoadError::Parse { line: 2, field: "0000000z".into() })
    );
}

#[test]
fn binary_prints_and_exits_zero() {
    let file = write_program(PRINT8);
    let output = run_binary(file.path());

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "8\n");
}

#[test]
fn binary_unknown_instruction_exits_one() {
    // LDI R0,8; PRN R0; 0xFF; PRN R0
    let file = write_program("10000010\n00000000\n00001000\n01000111\n00000000\n11111111\n01000111\n00000000\n");
    let output = run_binary(file.path());

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "8\n");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("255"), "stderr: {}", stderr);
    assert!(stderr.contains("0b11111111"), "stderr: {}", stderr);
    assert!(stderr.contains("at line 6 (address 5)"), "stderr: {}", stderr);
}

#[test]
fn binary_missing_file_exits_two() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let output = run_binary(&dir.path().join("missing.ls8"));

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn binary_malformed_file_exits_three() {
    let file = write_program("1000001x\n");
    assert_eq!(run_binary(file.path()).status.code(), Some(3));
}

#[test]
fn binary_stack_overflow_exits_four() {
    // PUSH R0 with SP still 0.
    let file = write_program("01000101\n00000000\n00000001\n");
    assert_eq!(run_binary(file.path()).status.code(), Some(4));
}

#[test]
fn binary_cycle_limit_exits_five() {
    // JMP R0 with R0 = 0 spins forever.
    let file = write_program("01010100\n00000000\n");
    let output = Command::new(env!("CARGO_BIN_EXE_ls8"))
        .arg(file.path())
        .args(["--max-cycles", "100"])
        .output()
        .expect("failed to run ls8");

    assert_eq!(output.status.code(), Some(5));
}

#[cfg(target_os = "linux")]
#[test]
fn binary_output_failure_exits_seventy_four() {
    let file = write_program(PRINT8);
    let full = std::fs::OpenOptions::new()
        .write(true)
        .open("/dev/full")
        .expect("failed to open /dev/full");
    let output = Command::new(env!("CARGO_BIN_EXE_ls8"))
        .arg(file.path())
        .stdout(full)
        .output()
        .expect("failed to run ls8");

    assert_eq!(output.status.code(), Some(74));
}

#[test]
fn binary_trace_goes_to_stderr() {
    let file = write_program(PRINT8);
    let output = Command::new(env!("CARGO_BIN_EXE_ls8"))
        .arg(file.path())
        .arg("--trace")
        .output()
        .expect("failed to run ls8");

    assert_eq!(String::from_utf8_lossy(&output.stdout), "8\n");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("TRACE: 00 | 82 00 08 |"), "stderr: {}", stderr);
    assert!(stderr.contains("LDI R0,8"), "stderr: {}", stderr);
}

#[test]
fn binary_dumps_state_as_json() {
    let file = write_program(PRINT8);
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let dump = dir.path().join("state.json");

    let output = Command::new(env!("CARGO_BIN_EXE_ls8"))
        .arg(file.path())
        .arg("--dump-state")
        .arg(&dump)
        .output()
        .expect("failed to run ls8");
    assert_eq!(output.status.code(), Some(0));

    let json = std::fs::read_to_string(&dump).unwrap();
    let cpu: Cpu = serde_json::from_str(&json).unwrap();
    assert!(cpu.is_halted());
    assert_eq!(cpu.regs.get(0), 8);
    assert_eq!(cpu.cycles, 3);
}
