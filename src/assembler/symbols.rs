//! Labels and the forward references still waiting on them.
//!
//! A forward reference is a word already in the image whose low byte holds
//! a provisional value. Once the label is defined, its location is added to
//! that byte. Instructions with an implied PC index register have already
//! folded `-(use + 1)` into the byte, so the sum ends up PC-relative.
use super::error::ErrorKind;
use super::image::Image;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Label {
    pub name: String,
    pub location: usize,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ForwardReference {
    pub name: String,
    pub patch_location: usize,
}

#[derive(Default, Debug)]
pub struct SymbolTable {
    labels: Vec<Label>,
    forwards: Vec<ForwardReference>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks a label up by name. The first definition wins.
    pub fn lookup(&self, name: &str) -> Option<&Label> {
        self.labels.iter().find(|label| label.name == name)
    }

    /// Defines `name` at `location` and patches every pending reference to it.
    pub fn define(&mut self, name: &str, location: usize, image: &mut Image) -> Result<(), ErrorKind> {
        if let Some(prev) = self.lookup(name) {
            warn!("label `{}` redefined at 0x{:04X}; keeping 0x{:04X}", name, location, prev.location);
        }
        info!("label `{}` = 0x{:04X}", name, location);
        self.labels.push(Label { name: name.to_owned(), location });

        let (matched, pending): (Vec<_>, Vec<_>) = self.forwards
            .drain(..)
            .partition(|fwd| fwd.name == name);
        self.forwards = pending;

        // NOTE: the patched byte is not range checked, so a PC-relative
        // target more than 127 words ahead wraps around.
        for fwd in matched {
            let old = image.word(fwd.patch_location)
                .ok_or(ErrorKind::InvalidPatchLocation(fwd.patch_location))?;
            let hi = old & 0xFF00;
            let lo = old.wrapping_add(location as u16) & 0x00FF;
            info!("patched 0x{:04X}: 0x{:04X} -> 0x{:04X}", fwd.patch_location, old, hi | lo);
            image.rewrite(fwd.patch_location, hi | lo)?;
        }
        Ok(())
    }

    /// Resolves a label reference made from `use_location`. Labels not yet
    /// defined are queued for patching and read as zero for now.
    pub fn resolve(&mut self, name: &str, use_location: usize) -> i64 {
        if let Some(label) = self.lookup(name) {
            return label.location as i64;
        }
        self.forwards.push(ForwardReference { name: name.to_owned(), patch_location: use_location });
        0
    }

    /// Names of all references still pending, each listed once in the
    /// order first seen.
    pub fn unresolved_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for fwd in &self.forwards {
            if !names.contains(&fwd.name) {
                names.push(fwd.name.clone());
            }
        }
        names
    }
}
