/// Compile-time table of local variable names.
///
/// Names are borrowed straight from the source. Slots are dense and handed
/// out in order of first assignment.
#[derive(Debug, Clone)]
pub struct Locals<'src> {
    names: Vec<&'src [u8]>,
    max: usize,
}

impl<'src> Locals<'src> {
    pub fn new(max: usize) -> Self {
        Locals {
            names: Vec::new(),
            max,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn resolve(&self, name: &[u8]) -> Option<u8> {
        self.names
            .iter()
            .position(|n| *n == name)
            .and_then(|i| u8::try_from(i).ok())
    }

    /// Returns the slot for `name`, allocating the next one if it is new.
    ///
    /// `None` means the table is full.
    pub fn resolve_or_declare(&mut self, name: &'src [u8]) -> Option<u8> {
        if let Some(slot) = self.resolve(name) {
            return Some(slot);
        }
        if self.names.len() >= self.max {
            return None;
        }
        let slot = u8::try_from(self.names.len()).ok()?;
        self.names.push(name);
        Some(slot)
    }
}
