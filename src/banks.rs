//! Static sound-bank configuration.
//!
//! Banks are read once at startup and never mutated. Each bank is an ordered
//! sequence of [`SoundDescriptor`]s, one per pad.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::audio_engine::errors::ConfigError;

/// Presentation-only color tag of a pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PadColor {
    Blue,
    Purple,
    Cyan,
    Magenta,
    Green,
    Red,
}

impl PadColor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Cyan => "cyan",
            Self::Magenta => "magenta",
            Self::Green => "green",
            Self::Red => "red",
        }
    }
}

/// Immutable description of one pad's sound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundDescriptor {
    /// Pad identity, unique within a bank.
    pub id: String,
    pub label: String,
    /// Source path, resolved against the asset root.
    pub path: String,
    pub color: PadColor,
    /// Loops by default, independent of any manual override.
    #[serde(default, rename = "loop")]
    pub looped: bool,
}

impl SoundDescriptor {
    pub fn new(id: &str, label: &str, path: &str, color: PadColor) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            path: path.to_string(),
            color,
            looped: false,
        }
    }

    pub fn looped(mut self) -> Self {
        self.looped = true;
        self
    }
}

/// A named, switchable collection of pads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub id: String,
    pub name: String,
    pub sounds: Vec<SoundDescriptor>,
}

impl Bank {
    pub fn sound(&self, pad_id: &str) -> Option<&SoundDescriptor> {
        self.sounds.iter().find(|sound| sound.id == pad_id)
    }
}

/// Ordered, validated set of banks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BankSet {
    banks: Vec<Bank>,
}

impl BankSet {
    /// Validates bank and pad identities.
    pub fn new(banks: Vec<Bank>) -> Result<Self, ConfigError> {
        if banks.is_empty() {
            return Err(ConfigError::NoBanks);
        }

        let mut bank_ids = HashSet::new();
        for bank in &banks {
            if !bank_ids.insert(bank.id.as_str()) {
                return Err(ConfigError::DuplicateBank {
                    bank: bank.id.clone(),
                });
            }
            if bank.sounds.is_empty() {
                return Err(ConfigError::EmptyBank {
                    bank: bank.id.clone(),
                });
            }

            let mut pad_ids = HashSet::new();
            for sound in &bank.sounds {
                if !pad_ids.insert(sound.id.as_str()) {
                    return Err(ConfigError::DuplicatePad {
                        bank: bank.id.clone(),
                        pad: sound.id.clone(),
                    });
                }
            }
        }

        Ok(Self { banks })
    }

    pub fn banks(&self) -> &[Bank] {
        &self.banks
    }

    pub fn position(&self, bank_id: &str) -> Option<usize> {
        self.banks.iter().position(|bank| bank.id == bank_id)
    }

    pub fn len(&self) -> usize {
        self.banks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }
}

impl Default for BankSet {
    fn default() -> Self {
        Self {
            banks: default_banks(),
        }
    }
}

impl<'de> Deserialize<'de> for BankSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let banks = Vec::<Bank>::deserialize(deserializer)?;
        BankSet::new(banks).map_err(serde::de::Error::custom)
    }
}

/// The built-in banks: "A" holds one-shots, "B" starts with four default loops.
pub fn default_banks() -> Vec<Bank> {
    use PadColor::*;

    let bank_a = vec![
        SoundDescriptor::new("a1", "fahh", "./sounds/fahh.mp3", Red),
        SoundDescriptor::new("a2", "38 cepagaria?", "./sounds/cepagaria.mp3", Blue),
        SoundDescriptor::new("a3", "38 ceprefere", "./sounds/ceprefere.mp3", Purple),
        SoundDescriptor::new("a4", "como ñ posso?", "./sounds/tailung.mp3", Green),
        SoundDescriptor::new("a5", "Sad Violin", "./sounds/sad-violin.mp3", Blue),
        SoundDescriptor::new("a6", "Aplause", "./sounds/applause.mp3", Magenta),
        SoundDescriptor::new("a7", "Drum Roll", "./sounds/drumroll.mp3", Cyan),
        SoundDescriptor::new("a8", "Ba Dum Tss", "./sounds/badumtss.mp3", Green),
        SoundDescriptor::new("a9", "Oh No", "./sounds/oh-no.mp3", Red),
        SoundDescriptor::new("a10", "Wow", "./sounds/anime-wow.mp3", Magenta),
        SoundDescriptor::new("a11", "Quack", "./sounds/quack.mp3", Cyan),
        SoundDescriptor::new("a12", "Fart", "./sounds/fart-reverb.mp3", Purple),
        SoundDescriptor::new("a13", "Error", "./sounds/windows-error.mp3", Red),
        SoundDescriptor::new("a14", "Success", "./sounds/success.mp3", Green),
        SoundDescriptor::new("a15", "Nani?", "./sounds/nani.mp3", Red),
        SoundDescriptor::new("a16", "Gong", "./sounds/gong.mp3", Blue),
    ];

    let bank_b = vec![
        SoundDescriptor::new("b1", "Techno Kick", "./sounds/kick.mp3", Cyan).looped(),
        SoundDescriptor::new("b2", "Techno Hat", "./sounds/hihat.mp3", Cyan).looped(),
        SoundDescriptor::new("b3", "Bass Line", "./sounds/bass.mp3", Purple).looped(),
        SoundDescriptor::new("b4", "Synth Lead", "./sounds/synth.mp3", Magenta).looped(),
        SoundDescriptor::new("b5", "Vocals", "./sounds/vocals.mp3", Blue),
        SoundDescriptor::new("b6", "Siren", "./sounds/siren.mp3", Red),
        SoundDescriptor::new("b7", "Laser", "./sounds/laser.mp3", Green),
        SoundDescriptor::new("b8", "Explosion", "./sounds/explosion.mp3", Red),
        SoundDescriptor::new("b9", "Scratch", "./sounds/scratch.mp3", Blue),
        SoundDescriptor::new("b10", "Rewind", "./sounds/rewind.mp3", Purple),
        SoundDescriptor::new("b11", "Horn", "./sounds/horn.mp3", Magenta),
        SoundDescriptor::new("b12", "Whistle", "./sounds/whistle.mp3", Cyan),
        SoundDescriptor::new("b13", "Crowd", "./sounds/crowd.mp3", Green),
        SoundDescriptor::new("b14", "Laugh", "./sounds/laugh.mp3", Blue),
        SoundDescriptor::new("b15", "Boo", "./sounds/boo.mp3", Red),
        SoundDescriptor::new("b16", "Yeet", "./sounds/yeet.mp3", Purple),
    ];

    vec![
        Bank {
            id: "A".to_string(),
            name: "Bank A".to_string(),
            sounds: bank_a,
        },
        Bank {
            id: "B".to_string(),
            name: "Bank B".to_string(),
            sounds: bank_b,
        },
    ]
}
