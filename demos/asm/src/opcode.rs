//! Look up from operation names to op codes.

use phf::phf_map;
use std::fmt;

/// The group an operation belongs to. Codes of a group start at its offset.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Group {
    Basic,
    Combat,
    Upgrade,
    /// Assembler directives without a code of their own.
    Pseudo,
}

impl Group {
    pub const fn offset(self) -> Option<u8> {
        match self {
            Self::Basic => Some(0),
            Self::Combat => Some(32),
            Self::Upgrade => Some(64),
            Self::Pseudo => None,
        }
    }
}

/// The operands an operation takes, after the operation itself.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Format {
    /// No operand.
    Bare,
    /// `A`: one register.
    Register,
    /// `AI`: a register and a 20-bit unsigned immediate.
    RegisterImmediate,
    /// `ABCS`: three registers and a 10-bit signed immediate, which may be left out.
    ThreeRegisters,
    /// `L`: a 32-bit immediate.
    Long,
}

impl Format {
    pub const fn letters(self) -> &'static str {
        match self {
            Self::Bare => "",
            Self::Register => "A",
            Self::RegisterImmediate => "AI",
            Self::ThreeRegisters => "ABCS",
            Self::Long => "L",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bare => f.write_str("<none>"),
            _ => f.write_str(self.letters()),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Opcode {
    pub group: Group,
    /// The 7-bit op code; `None` for pseudo operations.
    pub code: Option<u8>,
    pub format: Format,
}

impl Opcode {
    const fn new(group: Group, code: u8, format: Format) -> Self {
        Self {
            group,
            code: Some(code),
            format,
        }
    }

    const fn pseudo(format: Format) -> Self {
        Self {
            group: Group::Pseudo,
            code: None,
            format,
        }
    }

    /// The position of this operation inside its group.
    pub fn index_in_group(&self) -> Option<u8> {
        Some(self.code? - self.group.offset()?)
    }
}

use Format::{Bare, Register as A, RegisterImmediate as AI, ThreeRegisters as ABCS};
use Group::{Basic, Combat, Upgrade};

static OPERATIONS: phf::Map<&'static str, Opcode> = phf_map! {
    "ADD" => Opcode::new(Basic, 0, ABCS),
    "SUB" => Opcode::new(Basic, 1, ABCS),
    "MUL" => Opcode::new(Basic, 2, ABCS),
    "DIV" => Opcode::new(Basic, 3, ABCS),
    "AND" => Opcode::new(Basic, 4, ABCS),
    "ORR" => Opcode::new(Basic, 5, ABCS),
    "XOR" => Opcode::new(Basic, 6, ABCS),
    "NAN" => Opcode::new(Basic, 7, ABCS),
    "CLZ" => Opcode::new(Basic, 8, ABCS),
    "CNT" => Opcode::new(Basic, 9, ABCS),
    "LSR" => Opcode::new(Basic, 10, ABCS),
    "LSL" => Opcode::new(Basic, 11, ABCS),
    "ABS" => Opcode::new(Basic, 12, ABCS),
    "RND" => Opcode::new(Basic, 13, ABCS),
    "CMP" => Opcode::new(Basic, 14, ABCS),
    "JIZ" => Opcode::new(Basic, 15, AI),
    "JNZ" => Opcode::new(Basic, 16, AI),
    "JGZ" => Opcode::new(Basic, 17, AI),
    "JLZ" => Opcode::new(Basic, 18, AI),
    "JGE" => Opcode::new(Basic, 19, AI),
    "JLE" => Opcode::new(Basic, 20, AI),
    "BIZ" => Opcode::new(Basic, 21, AI),
    "BNZ" => Opcode::new(Basic, 22, AI),
    "BGZ" => Opcode::new(Basic, 23, AI),
    "BLZ" => Opcode::new(Basic, 24, AI),
    "BGE" => Opcode::new(Basic, 25, AI),
    "BLE" => Opcode::new(Basic, 26, AI),
    "BLX" => Opcode::new(Basic, 27, AI),
    "LDR" => Opcode::new(Basic, 28, ABCS),
    "STR" => Opcode::new(Basic, 29, ABCS),
    "POP" => Opcode::new(Basic, 30, ABCS),
    "PSH" => Opcode::new(Basic, 31, ABCS),

    "WHO" => Opcode::new(Combat, 32, ABCS),
    "WHT" => Opcode::new(Combat, 33, ABCS),
    "QCS" => Opcode::new(Combat, 34, ABCS),
    "QCT" => Opcode::new(Combat, 35, ABCS),
    "QBP" => Opcode::new(Combat, 36, ABCS),
    "QCK" => Opcode::new(Combat, 37, ABCS),
    "GND" => Opcode::new(Combat, 38, ABCS),
    "WHR" => Opcode::new(Combat, 39, ABCS),
    "DST" => Opcode::new(Combat, 40, ABCS),
    "CVR" => Opcode::new(Combat, 41, ABCS),
    "DED" => Opcode::new(Combat, 42, ABCS),
    "SHT" => Opcode::new(Combat, 43, ABCS),
    "DIR" => Opcode::new(Combat, 44, ABCS),
    "WLK" => Opcode::new(Combat, 45, ABCS),
    "CRL" => Opcode::new(Combat, 46, ABCS),
    "SWM" => Opcode::new(Combat, 47, ABCS),
    "CAP" => Opcode::new(Combat, 48, Bare),
    "LIN" => Opcode::new(Combat, 49, Bare),
    "HID" => Opcode::new(Combat, 50, AI),
    "SAY" => Opcode::new(Combat, 51, AI),
    "RAD" => Opcode::new(Combat, 52, AI),
    "YEL" => Opcode::new(Combat, 53, AI),
    "EAR" => Opcode::new(Combat, 54, AI),
    "DIE" => Opcode::new(Combat, 55, ABCS),
    "NRT" => Opcode::new(Combat, 56, ABCS),
    "NRE" => Opcode::new(Combat, 57, ABCS),
    "EST" => Opcode::new(Combat, 58, ABCS),
    "SOE" => Opcode::new(Combat, 59, ABCS),
    "SOT" => Opcode::new(Combat, 60, ABCS),
    "SOW" => Opcode::new(Combat, 61, ABCS),
    "WST" => Opcode::new(Combat, 62, ABCS),
    "NRW" => Opcode::new(Combat, 63, ABCS),

    "WCS" => Opcode::new(Upgrade, 64, A),
    "WCT" => Opcode::new(Upgrade, 65, A),
    "WBP" => Opcode::new(Upgrade, 66, A),
    "WCL" => Opcode::new(Upgrade, 67, A),
    "TCS" => Opcode::new(Upgrade, 68, AI),
    "TCT" => Opcode::new(Upgrade, 69, AI),
    "TBP" => Opcode::new(Upgrade, 70, AI),
    "TCL" => Opcode::new(Upgrade, 71, AI),
    "PNT" => Opcode::new(Upgrade, 72, A),
    "CCS" => Opcode::new(Upgrade, 73, A),
    "CCT" => Opcode::new(Upgrade, 74, A),
    "CBP" => Opcode::new(Upgrade, 75, A),
    "CCL" => Opcode::new(Upgrade, 76, A),
    "UCS" => Opcode::new(Upgrade, 77, A),
    "UCT" => Opcode::new(Upgrade, 78, A),
    "UBP" => Opcode::new(Upgrade, 79, A),
    "UCL" => Opcode::new(Upgrade, 80, A),
    "DCS" => Opcode::new(Upgrade, 81, A),
    "DCT" => Opcode::new(Upgrade, 82, A),
    "DBP" => Opcode::new(Upgrade, 83, A),
    "DCL" => Opcode::new(Upgrade, 84, A),
    "MCS" => Opcode::new(Upgrade, 85, A),
    "MCT" => Opcode::new(Upgrade, 86, A),
    "MBP" => Opcode::new(Upgrade, 87, A),
    "MCL" => Opcode::new(Upgrade, 88, A),
    "RCS" => Opcode::new(Upgrade, 89, A),
    "RCT" => Opcode::new(Upgrade, 90, A),
    "RBP" => Opcode::new(Upgrade, 91, A),
    "RCL" => Opcode::new(Upgrade, 92, A),
    "TIM" => Opcode::new(Upgrade, 93, ABCS),
    "DLY" => Opcode::new(Upgrade, 94, Bare),
    "ADV" => Opcode::new(Upgrade, 95, Bare),

    "RAW" => Opcode::pseudo(Format::Long),
};

/// Find an operation by name, ignoring case.
///
/// Returns the canonical (upper case) name together with its op code.
pub fn lookup(name: &str) -> Option<(&'static str, &'static Opcode)> {
    if name.len() != 3 {
        return None;
    }
    let upper = name.to_ascii_uppercase();
    OPERATIONS
        .get_entry(upper.as_str())
        .map(|(name, opcode)| (*name, opcode))
}

pub fn is_operation(name: &str) -> bool {
    lookup(name).is_some()
}

/// Iterate over all known operations, in no particular order.
pub fn operations() -> impl Iterator<Item = (&'static str, &'static Opcode)> {
    OPERATIONS.entries().map(|(name, opcode)| (*name, opcode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let (name, add) = lookup("add").unwrap();
        assert_eq!(name, "ADD");
        assert_eq!(add.code, Some(0));
        assert_eq!(add.format, Format::ThreeRegisters);
        assert_eq!(lookup("Jiz").unwrap().1.format, Format::RegisterImmediate);
        assert!(lookup("ADDX").is_none());
        assert!(lookup("foo").is_none());
    }

    #[test]
    fn groups_and_offsets() {
        let (_, who) = lookup("WHO").unwrap();
        assert_eq!(who.group, Group::Combat);
        assert_eq!(who.index_in_group(), Some(0));

        let (_, adv) = lookup("ADV").unwrap();
        assert_eq!(adv.group, Group::Upgrade);
        assert_eq!(adv.index_in_group(), Some(31));

        let (_, raw) = lookup("raw").unwrap();
        assert_eq!(raw.code, None);
        assert_eq!(raw.format, Format::Long);
        assert_eq!(raw.index_in_group(), None);
    }

    #[test]
    fn codes_are_unique_and_within_groups() {
        let mut seen = [false; 96];
        for (name, opcode) in operations() {
            let Some(code) = opcode.code else {
                assert_eq!(opcode.group, Group::Pseudo, "{}", name);
                continue;
            };
            assert!(!seen[code as usize], "duplicate code {} ({})", code, name);
            seen[code as usize] = true;
            assert!(opcode.index_in_group().unwrap() < 32, "{}", name);
        }
        assert!(seen.iter().all(|seen| *seen));
    }
}
