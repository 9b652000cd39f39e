//! Typed view over the connection and plugin settings keys.

use partlink_core::catalog::CompanyId;
use partlink_core::settings::SettingsStore;
use partlink_core::{SupplierError, SupplierResult};
use std::fmt;
use std::str::FromStr;

pub const DIGI_CLIENT_ID: &str = "DIGI_CLIENT_ID";
pub const DIGI_CLIENT_SECRET: &str = "DIGI_CLIENT_SECRET";
pub const LOCALE_SITE: &str = "LOCALE_SITE";
pub const LOCALE_LANGUAGE: &str = "LOCALE_LANGUAGE";
pub const LOCALE_CURRENCY: &str = "LOCALE_CURRENCY";
pub const CUSTOMER_ID: &str = "CUSTOMER_ID";
/// Raw JSON body of the last successful token exchange.
pub const RESPONSE: &str = "RESPONSE";
pub const AUTHENTICATED: &str = "AUTHENTICATED";

pub const SEARCH_ENABLED: &str = "SEARCH_ENABLED";
pub const ORDER_ENABLED: &str = "ORDER_ENABLED";
pub const RELATED_VENDOR: &str = "RELATED_VENDOR";

/// Every key the plugin reads, for hosts that render a settings form.
pub const ALL_KEYS: &[&str] = &[
    DIGI_CLIENT_ID,
    DIGI_CLIENT_SECRET,
    LOCALE_SITE,
    LOCALE_LANGUAGE,
    LOCALE_CURRENCY,
    CUSTOMER_ID,
    RESPONSE,
    AUTHENTICATED,
    SEARCH_ENABLED,
    ORDER_ENABLED,
    RELATED_VENDOR,
];

macro_rules! locale_enum {
    ($(#[$meta:meta])* $name:ident, default = $default:ident, { $($variant:ident => $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                #[doc = $code]
                $variant,
            )+
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }
        }

        impl FromStr for $name {
            type Err = SupplierError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str().eq_ignore_ascii_case(value.trim()))
                    .ok_or_else(|| SupplierError::Validation {
                        message: format!("unsupported {} {:?}", stringify!($name), value),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

locale_enum!(
    /// Digi-Key storefront the prices and stock are quoted for.
    LocaleSite, default = Us, {
        Us => "US", Ca => "CA", Jp => "JP", Uk => "UK", De => "DE", At => "AT",
        Be => "BE", Dk => "DK", Fi => "FI", Gr => "GR", Ie => "IE", It => "IT",
        Lu => "LU", Nl => "NL", No => "NO", Pt => "PT", Es => "ES", Kr => "KR",
        Hk => "HK", Sg => "SG", Cn => "CN", Tw => "TW", Au => "AU", Fr => "FR",
        In => "IN", Nz => "NZ", Se => "SE", Mx => "MX", Ch => "CH", Il => "IL",
        Pl => "PL", Sk => "SK", Si => "SI", Lv => "LV", Lt => "LT", Ee => "EE",
        Cz => "CZ", Hu => "HU", Bg => "BG", My => "MY", Za => "ZA", Ro => "RO",
        Th => "TH", Ph => "PH",
    }
);

locale_enum!(
    LocaleLanguage, default = En, {
        En => "en", Ja => "ja", De => "de", Fr => "fr", Ko => "ko", Zhs => "zhs",
        Zht => "zht", It => "it", Es => "es", He => "he", Nl => "nl", Sv => "sv",
        Pl => "pl", Fi => "fi", Da => "da", No => "no",
    }
);

locale_enum!(
    LocaleCurrency, default = Usd, {
        Usd => "USD", Cad => "CAD", Jpy => "JPY", Gbp => "GBP", Eur => "EUR",
        Hkd => "HKD", Sgd => "SGD", Twd => "TWD", Krw => "KRW", Aud => "AUD",
        Nzd => "NZD", Inr => "INR", Dkk => "DKK", Nok => "NOK", Sek => "SEK",
        Ils => "ILS", Cny => "CNY", Pln => "PLN", Chf => "CHF", Czk => "CZK",
        Huf => "HUF", Ron => "RON", Zar => "ZAR", Myr => "MYR", Thb => "THB",
        Php => "PHP",
    }
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Locale {
    pub site: LocaleSite,
    pub language: LocaleLanguage,
    pub currency: LocaleCurrency,
}

/// Reads a locale component, falling back to its default when unset or blank.
fn read_locale<T: FromStr<Err = SupplierError> + Default>(
    settings: &dyn SettingsStore,
    key: &str,
) -> SupplierResult<T> {
    match settings.get(key)? {
        Some(raw) if !raw.trim().is_empty() => raw.parse(),
        _ => Ok(T::default()),
    }
}

pub fn locale(settings: &dyn SettingsStore) -> SupplierResult<Locale> {
    Ok(Locale {
        site: read_locale(settings, LOCALE_SITE)?,
        language: read_locale(settings, LOCALE_LANGUAGE)?,
        currency: read_locale(settings, LOCALE_CURRENCY)?,
    })
}

pub fn customer_id(settings: &dyn SettingsStore) -> SupplierResult<String> {
    Ok(settings
        .get(CUSTOMER_ID)?
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| "0".into()))
}

pub fn client_id(settings: &dyn SettingsStore) -> SupplierResult<String> {
    Ok(settings.get(DIGI_CLIENT_ID)?.unwrap_or_default())
}

pub fn client_secret(settings: &dyn SettingsStore) -> SupplierResult<String> {
    Ok(settings.get(DIGI_CLIENT_SECRET)?.unwrap_or_default())
}

pub fn search_enabled(settings: &dyn SettingsStore) -> SupplierResult<bool> {
    Ok(settings.get_bool(SEARCH_ENABLED)?.unwrap_or(true))
}

pub fn order_enabled(settings: &dyn SettingsStore) -> SupplierResult<bool> {
    Ok(settings.get_bool(ORDER_ENABLED)?.unwrap_or(false))
}

pub fn related_vendor(settings: &dyn SettingsStore) -> SupplierResult<Option<CompanyId>> {
    match settings.get(RELATED_VENDOR)? {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<u64>()
            .map(|id| Some(CompanyId(id)))
            .map_err(|_| SupplierError::Validation {
                message: format!("{RELATED_VENDOR} must be a company id, got {raw:?}"),
            }),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partlink_core::settings::MemorySettings;

    #[test]
    fn locale_defaults_when_unset() {
        let settings = MemorySettings::new();
        assert_eq!(
            locale(&settings).unwrap(),
            Locale {
                site: LocaleSite::Us,
                language: LocaleLanguage::En,
                currency: LocaleCurrency::Usd,
            }
        );
        assert_eq!(customer_id(&settings).unwrap(), "0");
    }

    #[test]
    fn locale_parses_codes_case_insensitively() {
        let settings = MemorySettings::new()
            .with(LOCALE_SITE, "de")
            .with(LOCALE_LANGUAGE, "DE")
            .with(LOCALE_CURRENCY, "eur");
        let parsed = locale(&settings).unwrap();
        assert_eq!(parsed.site, LocaleSite::De);
        assert_eq!(parsed.language, LocaleLanguage::De);
        assert_eq!(parsed.currency.as_str(), "EUR");
    }

    #[test]
    fn unknown_locale_is_rejected() {
        let settings = MemorySettings::new().with(LOCALE_CURRENCY, "XYZ");
        assert!(matches!(
            locale(&settings),
            Err(SupplierError::Validation { .. })
        ));
    }

    #[test]
    fn plugin_flags_have_defaults() {
        let settings = MemorySettings::new().with(RELATED_VENDOR, "12");
        assert!(search_enabled(&settings).unwrap());
        assert!(!order_enabled(&settings).unwrap());
        assert_eq!(related_vendor(&settings).unwrap(), Some(CompanyId(12)));
    }
}
