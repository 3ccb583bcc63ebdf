//! Method and clarity resolution from two language ladders.

use parley_types::{Channel, ChannelMask, CommMethod, LanguageId, LanguageLadder};

/// Clarity multiplier for gesture-and-signal communication.
pub const SIGNS_CLARITY: f32 = 0.3;

/// Channels able to carry gestures and signals.
const SIGN_CHANNELS: [Channel; 4] = [Channel::Vision, Channel::Proximity, Channel::Hearing, Channel::Em];

/// Outcome of matching two ladders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// How the message will be encoded.
    pub method: CommMethod,
    /// Estimated understanding before transmission (0-1).
    pub clarity: f32,
    /// The shared language, for language methods.
    pub language: Option<LanguageId>,
}

impl Resolution {
    const FAILED: Self = Self {
        method: CommMethod::FailedCommunication,
        clarity: 0.0,
        language: None,
    };
}

/// Pick the best method the two parties share.
///
/// `shared` is the intersection of both endpoints' channels; signs need at
/// least one channel a gesture can travel over.
pub fn resolve(
    sender: Option<&LanguageLadder>,
    receiver: Option<&LanguageLadder>,
    base_clarity: f32,
    shared: ChannelMask,
) -> Resolution {
    let base = base_clarity.clamp(0.0, 1.0);
    if base <= 0.0 {
        return Resolution::FAILED;
    }

    if let (Some(sender), Some(receiver)) = (sender, receiver) {
        let mut native: Option<(f32, LanguageId)> = None;
        let mut known: Option<(f32, LanguageId)> = None;
        for ours in &sender.entries {
            let Some(theirs) = receiver.entry(ours.language) else {
                continue;
            };
            if ours.native && theirs.native {
                let clarity = base * theirs.level.factor();
                if native.is_none_or(|(best, _)| clarity > best) {
                    native = Some((clarity, ours.language));
                }
            } else {
                let clarity = base * ours.level.factor().min(theirs.level.factor());
                if known.is_none_or(|(best, _)| clarity > best) {
                    known = Some((clarity, ours.language));
                }
            }
        }
        if let Some((clarity, language)) = native {
            return Resolution {
                method: CommMethod::NativeLanguage,
                clarity: clarity.clamp(0.0, 1.0),
                language: Some(language),
            };
        }
        if let Some((clarity, language)) = known {
            return Resolution {
                method: CommMethod::KnownLanguage,
                clarity: clarity.clamp(0.0, 1.0),
                language: Some(language),
            };
        }
    }

    if shared.first_in(&SIGN_CHANNELS).is_none() {
        return Resolution::FAILED;
    }
    Resolution {
        method: CommMethod::GeneralSigns,
        clarity: (base * SIGNS_CLARITY).clamp(0.0, 1.0),
        language: None,
    }
}

#[cfg(test)]
mod tests {
    use parley_types::{LanguageEntry, ProficiencyLevel};

    use super::*;

    fn ladder(entries: &[(u16, ProficiencyLevel, bool)]) -> LanguageLadder {
        LanguageLadder::new(
            entries
                .iter()
                .map(|(id, level, native)| LanguageEntry {
                    language: LanguageId(*id),
                    level: *level,
                    native: *native,
                })
                .collect(),
        )
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn shared_native_uses_receiver_factor() {
        let a = ladder(&[(1, ProficiencyLevel::Mastery, true)]);
        let b = ladder(&[(1, ProficiencyLevel::Fluent, true)]);
        let r = resolve(Some(&a), Some(&b), 1.0, ChannelMask::ALL);
        assert_eq!(r.method, CommMethod::NativeLanguage);
        assert!(close(r.clarity, 0.8));
        assert_eq!(r.language, Some(LanguageId(1)));
    }

    #[test]
    fn known_language_uses_weaker_factor() {
        let a = ladder(&[(1, ProficiencyLevel::Mastery, true), (2, ProficiencyLevel::Fluent, false)]);
        let b = ladder(&[(3, ProficiencyLevel::Mastery, true), (2, ProficiencyLevel::Conversational, false)]);
        let r = resolve(Some(&a), Some(&b), 1.0, ChannelMask::ALL);
        assert_eq!(r.method, CommMethod::KnownLanguage);
        assert!(close(r.clarity, 0.6));
    }

    #[test]
    fn native_beats_better_known_language() {
        let a = ladder(&[(1, ProficiencyLevel::Rudimentary, true), (2, ProficiencyLevel::Mastery, false)]);
        let b = ladder(&[(1, ProficiencyLevel::Basic, true), (2, ProficiencyLevel::Mastery, false)]);
        let r = resolve(Some(&a), Some(&b), 1.0, ChannelMask::ALL);
        assert_eq!(r.method, CommMethod::NativeLanguage);
        assert!(close(r.clarity, 0.4));
    }

    #[test]
    fn no_shared_language_falls_back_to_signs() {
        let a = ladder(&[(1, ProficiencyLevel::Mastery, true)]);
        let b = ladder(&[(2, ProficiencyLevel::Mastery, true)]);
        let r = resolve(Some(&a), Some(&b), 0.5, ChannelMask::ALL);
        assert_eq!(r.method, CommMethod::GeneralSigns);
        assert!(close(r.clarity, 0.15));
        assert_eq!(r.language, None);
    }

    #[test]
    fn signs_need_a_gesture_channel() {
        let r = resolve(None, None, 1.0, ChannelMask::only(Channel::Paranormal));
        assert_eq!(r.method, CommMethod::FailedCommunication);
        assert!(close(r.clarity, 0.0));
    }

    #[test]
    fn zero_base_clarity_fails() {
        let a = ladder(&[(1, ProficiencyLevel::Mastery, true)]);
        let r = resolve(Some(&a), Some(&a), 0.0, ChannelMask::ALL);
        assert_eq!(r.method, CommMethod::FailedCommunication);
    }
}
