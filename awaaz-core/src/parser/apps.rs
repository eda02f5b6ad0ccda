//! UPI app identifier table.
//!
//! Maps package identifiers of known UPI apps to user-friendly display
//! names, and doubles as the allow list the notification source filters
//! against before the classifier is invoked.

/// Known UPI apps: `(package identifier, display name)`.
static KNOWN_UPI_APPS: &[(&str, &str)] = &[
    // Major UPI apps
    ("com.google.android.apps.nbu.paisa.user", "Google Pay"),
    ("com.phonepe.app", "PhonePe"),
    ("net.one97.paytm", "Paytm"),
    ("in.org.npci.upiapp", "BHIM UPI"),
    // E-commerce & wallets
    ("com.amazon.mShop.android.shopping", "Amazon Pay"),
    ("com.freecharge.android", "Freecharge"),
    ("com.mobikwik_new", "MobiKwik"),
    // Social & messaging
    ("com.whatsapp", "WhatsApp Pay"),
    // Business & merchant apps
    ("com.bharatpe.merchant.user", "BharatPe Merchant"),
    ("in.co.bharatpe", "BharatPe"),
    // Credit & lending
    ("com.dreamplug.androidapp", "CRED"),
    // Telecom payment apps
    ("com.myairtelapp", "Airtel Thanks"),
    ("com.airtel.money", "Airtel Money"),
    // Bank UPI apps
    ("com.csam.icici.bank.imobile", "iMobile Pay"),
    ("com.axis.mobile", "Axis Mobile"),
    ("com.sbi.lotusintouch", "YONO SBI"),
    ("com.sbi.SBIFreedomPlus", "YONO Lite"),
    ("com.snapwork.hdfc", "HDFC Bank"),
    ("com.fedbank.fednxt", "Federal Bank"),
    ("com.fss.pnb.mbanking", "PNB One"),
];

/// User-friendly display name for `app_id`, falling back to the raw
/// identifier when unknown.
pub fn display_name(app_id: &str) -> &str {
    KNOWN_UPI_APPS
        .iter()
        .find(|(pkg, _)| *pkg == app_id)
        .map_or(app_id, |(_, name)| name)
}

/// Whether `app_id` is on the monitored-app allow list.
pub fn is_monitored_app(app_id: &str) -> bool {
    KNOWN_UPI_APPS.iter().any(|(pkg, _)| *pkg == app_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_packages_map_to_display_names() {
        assert_eq!(display_name("com.phonepe.app"), "PhonePe");
        assert_eq!(display_name("net.one97.paytm"), "Paytm");
        assert_eq!(display_name("com.whatsapp"), "WhatsApp Pay");
    }

    #[test]
    fn unknown_packages_fall_back_to_the_identifier() {
        assert_eq!(display_name("com.example.wallet"), "com.example.wallet");
    }

    #[test]
    fn allow_list_matches_the_display_table() {
        assert!(is_monitored_app("com.google.android.apps.nbu.paisa.user"));
        assert!(!is_monitored_app("com.example.wallet"));
    }
}
