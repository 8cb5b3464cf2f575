//! Output formatting for CLI display.
//!
//! Provides the [`PrettyPrint`] trait for human-readable output
//! as an alternative to JSON serialization.

use crate::{Company, Package, Resource};

/// Trait for human-readable key-value output.
///
/// Implemented by entity types to provide formatted output
/// suitable for terminal display when `--json` is not specified.
pub trait PrettyPrint {
    /// Returns a formatted string for terminal display.
    fn pretty_print(&self) -> String;
}

impl PrettyPrint for Package {
    fn pretty_print(&self) -> String {
        let header = format!("Package: {}", self.name);
        let divider = "─".repeat(header.chars().count().max(30));

        let mut lines = vec![header, divider, format!("ID:             {}", self.id)];

        if let Some(ref title) = self.title {
            lines.push(format!("Title:          {}", title));
        }

        lines.push(format!("Resources:      {}", self.resources.len()));
        for resource in &self.resources {
            match resource.pe_version {
                Some(ref version) => lines.push(format!("  - {} (v{})", resource.name, version)),
                None => lines.push(format!("  - {}", resource.name)),
            }
        }

        lines.join("\n")
    }
}

impl PrettyPrint for Resource {
    fn pretty_print(&self) -> String {
        let header = format!("Resource: {}", self.label());
        let divider = "─".repeat(header.chars().count().max(30));

        let mut lines = vec![header, divider, format!("ID:             {}", self.id)];

        if let Some(ref version) = self.pe_version {
            lines.push(format!("Version:        {}", version));
        }

        if let Some(format) = self.metadata.get("format").and_then(|f| f.as_str()) {
            lines.push(format!("Format:         {}", format));
        }

        if let Some(modified) = self.metadata.get("last_modified").and_then(|m| m.as_str()) {
            lines.push(format!("Modified:       {}", modified));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for Company {
    fn pretty_print(&self) -> String {
        let header = format!("Company: {}", self.name.as_deref().unwrap_or("(unnamed)"));
        let divider = "─".repeat(header.chars().count().max(30));

        let mut lines = vec![header, divider];

        if let Some(ref siret) = self.siret {
            lines.push(format!("SIRET:          {}", siret));
        }

        if let Some(ref naf_text) = self.naf_text {
            lines.push(format!("Sector:         {}", naf_text));
        }

        if let Some(ref city) = self.city {
            match self.distance {
                Some(distance) => lines.push(format!("City:           {} ({} km)", city, distance)),
                None => lines.push(format!("City:           {}", city)),
            }
        }

        if let Some(ref headcount) = self.headcount_text {
            lines.push(format!("Headcount:      {}", headcount));
        }

        lines.join("\n")
    }
}
