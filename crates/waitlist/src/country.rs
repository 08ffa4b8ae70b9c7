/// Dial code offered in the signup form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryCode {
    pub code: &'static str,
    pub label: &'static str,
}

pub const DEFAULT_COUNTRY_CODE: &str = "+1";

pub static COUNTRY_CODES: [CountryCode; 32] = [
    CountryCode { code: "+1", label: "US +1" },
    CountryCode { code: "+44", label: "UK +44" },
    CountryCode { code: "+34", label: "ES +34" },
    CountryCode { code: "+52", label: "MX +52" },
    CountryCode { code: "+33", label: "FR +33" },
    CountryCode { code: "+49", label: "DE +49" },
    CountryCode { code: "+39", label: "IT +39" },
    CountryCode { code: "+55", label: "BR +55" },
    CountryCode { code: "+57", label: "CO +57" },
    CountryCode { code: "+54", label: "AR +54" },
    CountryCode { code: "+56", label: "CL +56" },
    CountryCode { code: "+51", label: "PE +51" },
    CountryCode { code: "+58", label: "VE +58" },
    CountryCode { code: "+81", label: "JP +81" },
    CountryCode { code: "+82", label: "KR +82" },
    CountryCode { code: "+86", label: "CN +86" },
    CountryCode { code: "+91", label: "IN +91" },
    CountryCode { code: "+61", label: "AU +61" },
    CountryCode { code: "+64", label: "NZ +64" },
    CountryCode { code: "+351", label: "PT +351" },
    CountryCode { code: "+31", label: "NL +31" },
    CountryCode { code: "+46", label: "SE +46" },
    CountryCode { code: "+41", label: "CH +41" },
    CountryCode { code: "+43", label: "AT +43" },
    CountryCode { code: "+48", label: "PL +48" },
    CountryCode { code: "+90", label: "TR +90" },
    CountryCode { code: "+971", label: "AE +971" },
    CountryCode { code: "+966", label: "SA +966" },
    CountryCode { code: "+20", label: "EG +20" },
    CountryCode { code: "+27", label: "ZA +27" },
    CountryCode { code: "+234", label: "NG +234" },
    CountryCode { code: "+254", label: "KE +254" },
];

/// Looks up a dial code (`"+44"`, `"44"`) or a country prefix (`"UK"`).
pub fn find_country_code(input: &str) -> Option<&'static CountryCode> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let dial = if trimmed.starts_with('+') {
        trimmed.to_string()
    } else {
        format!("+{trimmed}")
    };
    COUNTRY_CODES
        .iter()
        .find(|entry| entry.code == dial)
        .or_else(|| {
            COUNTRY_CODES.iter().find(|entry| {
                entry
                    .label
                    .split_whitespace()
                    .next()
                    .is_some_and(|prefix| prefix.eq_ignore_ascii_case(trimmed))
            })
        })
}
