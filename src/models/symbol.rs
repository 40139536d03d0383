use super::{BitMatrix, ECLevel, MaskPattern, Version};

/// State of one module while a symbol is being assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Module {
    /// Dark module
    Dark,
    /// Light module
    Light,
    /// Not yet written (data area before placement and masking)
    #[default]
    Unset,
}

impl Module {
    /// From a dark/light flag
    pub fn from_dark(dark: bool) -> Self {
        if dark { Module::Dark } else { Module::Light }
    }

    /// True for dark modules only
    pub fn is_dark(self) -> bool {
        self == Module::Dark
    }
}

/// An encoded QR symbol: resolved parameters plus the square module grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrSymbol {
    version: Version,
    ec_level: ECLevel,
    mask: MaskPattern,
    size: usize,
    modules: Vec<Module>,
}

impl QrSymbol {
    /// Blank symbol with every module unset
    pub fn new(version: Version, ec_level: ECLevel) -> Self {
        let size = version.size();
        Self {
            version,
            ec_level,
            mask: MaskPattern::Pattern0,
            size,
            modules: vec![Module::Unset; size * size],
        }
    }

    /// Resolved version
    pub fn version(&self) -> Version {
        self.version
    }

    /// Resolved error correction level
    pub fn ec_level(&self) -> ECLevel {
        self.ec_level
    }

    /// Chosen mask pattern
    pub fn mask(&self) -> MaskPattern {
        self.mask
    }

    /// Side length in modules (4v + 17)
    pub fn size(&self) -> usize {
        self.size
    }

    /// Module at column `x`, row `y`
    pub fn get(&self, x: usize, y: usize) -> Module {
        if x >= self.size || y >= self.size {
            return Module::Light;
        }
        self.modules[y * self.size + x]
    }

    /// True if the module at (x, y) is dark
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.get(x, y).is_dark()
    }

    /// Row-major slices, one per row
    pub fn rows(&self) -> impl Iterator<Item = &[Module]> {
        self.modules.chunks(self.size)
    }

    /// Dark modules as a bit matrix (true = dark)
    pub fn to_bit_matrix(&self) -> BitMatrix {
        BitMatrix::from_fn(self.size, |x, y| self.is_dark(x, y))
    }

    /// True once every module has been written
    pub fn is_complete(&self) -> bool {
        !self.modules.contains(&Module::Unset)
    }

    pub(crate) fn set(&mut self, x: usize, y: usize, module: Module) {
        if x < self.size && y < self.size {
            self.modules[y * self.size + x] = module;
        }
    }

    pub(crate) fn set_dark(&mut self, x: usize, y: usize, dark: bool) {
        self.set(x, y, Module::from_dark(dark));
    }

    pub(crate) fn set_mask(&mut self, mask: MaskPattern) {
        self.mask = mask;
    }

    pub(crate) fn flip(&mut self, x: usize, y: usize) {
        let idx = y * self.size + x;
        self.modules[idx] = match self.modules[idx] {
            Module::Dark => Module::Light,
            Module::Light => Module::Dark,
            Module::Unset => Module::Unset,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_symbol_is_unset() {
        let v = Version::new(2).unwrap_or(Version::MIN);
        let mut symbol = QrSymbol::new(v, ECLevel::Q);
        assert_eq!(symbol.size(), 25);
        assert_eq!(symbol.get(3, 3), Module::Unset);
        assert!(!symbol.is_complete());

        symbol.set_dark(3, 3, true);
        assert!(symbol.is_dark(3, 3));
        symbol.flip(3, 3);
        assert_eq!(symbol.get(3, 3), Module::Light);
        assert_eq!(symbol.rows().count(), 25);
    }
}
