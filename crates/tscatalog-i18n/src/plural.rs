//! Plural-form rules used to order `<numerusform>` entries
//!
//! A numerus message stores one translation per plural category of the target
//! language. The categories are numbered the same way Qt Linguist and gettext
//! number them, so the index returned by [`PluralRule::form_index`] can be used
//! directly against the stored forms.

/// Plural rule family of a language
///
/// # Example
/// ```
/// use tscatalog_i18n::PluralRule;
///
/// let rule = PluralRule::for_locale("da");
/// assert_eq!(rule, PluralRule::Germanic);
/// assert_eq!(rule.form_index(1), 0);
/// assert_eq!(rule.form_index(7), 1);
///
/// assert_eq!(PluralRule::for_locale("zh_TW").form_count(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PluralRule {
	/// No plural distinction (ja, zh, ko, vi, ...)
	Single,
	/// `n == 1` is singular, everything else plural (en, da, de, nl, pt_PT, ...)
	#[default]
	Germanic,
	/// `n <= 1` is singular (fr, pt_BR)
	French,
	/// Three forms keyed on the last two digits (ru, uk, be, sr, hr, bs)
	Slavic,
	/// Three forms, `n == 1` singular (pl)
	Polish,
	/// Three forms, `2..=4` paucal (cs, sk)
	Czech,
	/// Four forms keyed on `n % 100` (sl)
	Slovenian,
	/// Three forms (lt)
	Lithuanian,
	/// Three forms with a separate zero form (lv)
	Latvian,
	/// Three forms (ro)
	Romanian,
	/// Five forms (ga)
	Irish,
	/// Six forms (cy)
	Welsh,
	/// Six forms (ar)
	Arabic,
}

impl PluralRule {
	/// Resolve the rule for a locale tag such as `da`, `pt_BR` or `zh-TW`
	///
	/// Unknown languages use [`PluralRule::Germanic`].
	pub fn for_locale(locale: &str) -> Self {
		let mut parts = locale.split(['-', '_']);
		let lang = parts.next().unwrap_or_default().to_ascii_lowercase();
		let region = parts.next().map(str::to_ascii_uppercase);

		match lang.as_str() {
			"ja" | "zh" | "ko" | "vi" | "th" | "id" | "ms" | "tr" | "fa" | "ka" => Self::Single,
			"fr" => Self::French,
			"pt" if region.as_deref() == Some("BR") => Self::French,
			"ru" | "uk" | "be" | "sr" | "hr" | "bs" => Self::Slavic,
			"pl" => Self::Polish,
			"cs" | "sk" => Self::Czech,
			"sl" => Self::Slovenian,
			"lt" => Self::Lithuanian,
			"lv" => Self::Latvian,
			"ro" => Self::Romanian,
			"ga" => Self::Irish,
			"cy" => Self::Welsh,
			"ar" => Self::Arabic,
			_ => Self::Germanic,
		}
	}

	/// Number of `<numerusform>` entries a finished message should carry
	pub fn form_count(self) -> usize {
		match self {
			Self::Single => 1,
			Self::Germanic | Self::French => 2,
			Self::Slavic
			| Self::Polish
			| Self::Czech
			| Self::Lithuanian
			| Self::Latvian
			| Self::Romanian => 3,
			Self::Slovenian => 4,
			Self::Irish => 5,
			Self::Welsh | Self::Arabic => 6,
		}
	}

	/// Index of the plural form to use for `count`
	pub fn form_index(self, count: u64) -> usize {
		let n10 = count % 10;
		let n100 = count % 100;

		match self {
			Self::Single => 0,

			Self::Germanic => usize::from(count != 1),

			Self::French => usize::from(count > 1),

			// form 0: n%10==1 && n%100!=11
			// form 1: n%10 in 2..=4 && n%100 not in 10..20
			Self::Slavic => {
				if n10 == 1 && n100 != 11 {
					0
				} else if (2..=4).contains(&n10) && !(10..20).contains(&n100) {
					1
				} else {
					2
				}
			}

			Self::Polish => {
				if count == 1 {
					0
				} else if (2..=4).contains(&n10) && !(10..20).contains(&n100) {
					1
				} else {
					2
				}
			}

			Self::Czech => {
				if count == 1 {
					0
				} else if (2..=4).contains(&count) {
					1
				} else {
					2
				}
			}

			Self::Slovenian => match n100 {
				1 => 0,
				2 => 1,
				3 | 4 => 2,
				_ => 3,
			},

			Self::Lithuanian => {
				if n10 == 1 && n100 != 11 {
					0
				} else if n10 >= 2 && !(10..20).contains(&n100) {
					1
				} else {
					2
				}
			}

			// form 2 is the zero form
			Self::Latvian => {
				if n10 == 1 && n100 != 11 {
					0
				} else if count != 0 {
					1
				} else {
					2
				}
			}

			Self::Romanian => {
				if count == 1 {
					0
				} else if count == 0 || (1..20).contains(&n100) {
					1
				} else {
					2
				}
			}

			Self::Irish => match count {
				1 => 0,
				2 => 1,
				3..=6 => 2,
				7..=10 => 3,
				_ => 4,
			},

			Self::Welsh => match count {
				0 => 0,
				1 => 1,
				2 => 2,
				3 => 3,
				6 => 4,
				_ => 5,
			},

			Self::Arabic => {
				if count == 0 {
					0
				} else if count == 1 {
					1
				} else if count == 2 {
					2
				} else if (3..=10).contains(&n100) {
					3
				} else if n100 >= 11 {
					4
				} else {
					5
				}
			}
		}
	}
}
