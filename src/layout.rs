//! Media sizes and page dimensions

use crate::ticket::QName;

/// Simple length type in millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length(pub f64);

impl Length {
    /// Create a length from millimeters
    pub fn from_mm(mm: f64) -> Self {
        Length(mm)
    }

    /// Create a length from inches
    pub fn from_inches(inches: f64) -> Self {
        Length(inches * 25.4)
    }

    /// Get the value in millimeters
    pub fn mm(&self) -> f64 {
        self.0
    }

    /// Get the value in points (1/72 inch)
    pub fn pt(&self) -> f64 {
        self.0 * 72.0 / 25.4
    }
}

/// Page dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDimensions {
    pub width: Length,
    pub height: Length,
}

impl PageDimensions {
    /// Same sheet turned on its side
    pub fn rotated(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

impl Default for PageDimensions {
    fn default() -> Self {
        MediaSize::Letter.dimensions()
    }
}

/// Media sizes the body parsers can name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSize {
    Letter,
    Legal,
    Executive,
    Ledger,
    A3,
    A4,
    A5,
    B5,
    Com10Envelope,
    MonarchEnvelope,
    DlEnvelope,
    C5Envelope,
}

impl MediaSize {
    /// Portrait dimensions
    pub fn dimensions(self) -> PageDimensions {
        let (w, h) = match self {
            MediaSize::Letter => (Length::from_inches(8.5), Length::from_inches(11.0)),
            MediaSize::Legal => (Length::from_inches(8.5), Length::from_inches(14.0)),
            MediaSize::Executive => (Length::from_inches(7.25), Length::from_inches(10.5)),
            MediaSize::Ledger => (Length::from_inches(11.0), Length::from_inches(17.0)),
            MediaSize::A3 => (Length::from_mm(297.0), Length::from_mm(420.0)),
            MediaSize::A4 => (Length::from_mm(210.0), Length::from_mm(297.0)),
            MediaSize::A5 => (Length::from_mm(148.0), Length::from_mm(210.0)),
            MediaSize::B5 => (Length::from_mm(176.0), Length::from_mm(250.0)),
            MediaSize::Com10Envelope => (Length::from_inches(4.125), Length::from_inches(9.5)),
            MediaSize::MonarchEnvelope => (Length::from_inches(3.875), Length::from_inches(7.5)),
            MediaSize::DlEnvelope => (Length::from_mm(110.0), Length::from_mm(220.0)),
            MediaSize::C5Envelope => (Length::from_mm(162.0), Length::from_mm(229.0)),
        };
        PageDimensions { width: w, height: h }
    }

    /// Print schema option name for `PageMediaSize`
    pub fn keyword(self) -> QName {
        let name = match self {
            MediaSize::Letter => "NorthAmericaLetter",
            MediaSize::Legal => "NorthAmericaLegal",
            MediaSize::Executive => "NorthAmericaExecutive",
            MediaSize::Ledger => "NorthAmericaTabloid",
            MediaSize::A3 => "ISOA3",
            MediaSize::A4 => "ISOA4",
            MediaSize::A5 => "ISOA5",
            MediaSize::B5 => "ISOB5Envelope",
            MediaSize::Com10Envelope => "NorthAmericaNumber10Envelope",
            MediaSize::MonarchEnvelope => "NorthAmericaMonarchEnvelope",
            MediaSize::DlEnvelope => "ISODLEnvelope",
            MediaSize::C5Envelope => "ISOC5Envelope",
        };
        QName::psk(name)
    }

    /// Media size from a PostScript / PCL/XL media name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        let size = match name.to_ascii_lowercase().as_str() {
            "letter" => MediaSize::Letter,
            "legal" => MediaSize::Legal,
            "executive" | "exec" => MediaSize::Executive,
            "ledger" | "tabloid" | "11x17" => MediaSize::Ledger,
            "a3" => MediaSize::A3,
            "a4" => MediaSize::A4,
            "a5" => MediaSize::A5,
            "b5" => MediaSize::B5,
            "com10" | "env10" => MediaSize::Com10Envelope,
            "monarch" | "envmonarch" => MediaSize::MonarchEnvelope,
            "dl" | "envdl" => MediaSize::DlEnvelope,
            "c5" | "envc5" => MediaSize::C5Envelope,
            _ => return None,
        };
        Some(size)
    }
}

/// Page orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
    ReversePortrait,
    ReverseLandscape,
}

impl Orientation {
    /// From the 0..=3 numbering shared by PCL5 and PCL/XL
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Orientation::Portrait),
            1 => Some(Orientation::Landscape),
            2 => Some(Orientation::ReversePortrait),
            3 => Some(Orientation::ReverseLandscape),
            _ => None,
        }
    }

    pub fn is_landscape(self) -> bool {
        matches!(self, Orientation::Landscape | Orientation::ReverseLandscape)
    }

    /// Print schema option name for `PageOrientation`
    pub fn keyword(self) -> QName {
        let name = match self {
            Orientation::Portrait => "Portrait",
            Orientation::Landscape => "Landscape",
            Orientation::ReversePortrait => "ReversePortrait",
            Orientation::ReverseLandscape => "ReverseLandscape",
        };
        QName::psk(name)
    }
}
