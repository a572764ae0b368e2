//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "binary"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Control CLI for inspecting OpenADR 3.0 documents."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, ValueEnum};
use oadr_model::{
    Country, Currency, ObjectType, Operation, PayloadType, ProgramType, ReadingType, UnitType,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum EnumKind {
    ObjectType,
    Operation,
    PayloadType,
    UnitType,
    ReadingType,
    ProgramType,
    Currency,
    Country,
}

#[derive(Debug, Args)]
pub struct EnumsCommand {
    /// Enumeration to list.
    #[arg(value_enum)]
    kind: EnumKind,
}

fn texts<T: ToString>(values: Vec<T>) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

impl EnumsCommand {
    pub fn execute(self) -> Result<ExitCode> {
        let values = match self.kind {
            EnumKind::ObjectType => texts(ObjectType::all_values()),
            EnumKind::Operation => texts(Operation::all_values()),
            EnumKind::PayloadType => texts(PayloadType::all_values()),
            EnumKind::UnitType => texts(UnitType::all_values()),
            EnumKind::ReadingType => texts(ReadingType::all_values()),
            EnumKind::ProgramType => texts(ProgramType::all_values()),
            EnumKind::Currency => texts(Currency::all_values()),
            EnumKind::Country => texts(Country::all_values()),
        };
        for value in values {
            println!("{value}");
        }
        Ok(ExitCode::SUCCESS)
    }
}
