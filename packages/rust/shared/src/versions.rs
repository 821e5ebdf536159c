//! GovInfo bill version codes.

/// `(code, label)` pairs for every bill version GovInfo publishes.
pub const BILL_VERSION_CODES: &[(&str, &str)] = &[
    ("as", "Amendment Ordered to be Printed (Senate)"),
    ("ash", "Additional Sponsors House"),
    ("ath", "Agreed to House"),
    ("ats", "Agreed to Senate"),
    ("cdh", "Committee Discharged House"),
    ("cds", "Committee Discharged Senate"),
    ("cph", "Considered and Passed House"),
    ("cps", "Considered and Passed Senate"),
    ("eah", "Engrossed Amendment House"),
    ("eas", "Engrossed Amendment Senate"),
    ("eh", "Engrossed in House"),
    ("enr", "Enrolled Bill"),
    ("es", "Engrossed in Senate"),
    ("fph", "Failed Passage House"),
    ("fps", "Failed Passage Senate"),
    ("hds", "Held at Desk Senate"),
    ("ih", "Introduced in House"),
    ("iph", "Indefinitely Postponed House"),
    ("ips", "Indefinitely Postponed Senate"),
    ("is", "Introduced in Senate"),
    ("lth", "Laid on Table in House"),
    ("lts", "Laid on Table in Senate"),
    ("pap", "Printed as Passed"),
    ("pcs", "Placed on Calendar Senate"),
    ("pp", "Public Print"),
    ("pvtl", "Private Law"),
    ("pl", "Public Law"),
    ("rch", "Reference Change House"),
    ("rcs", "Reference Change Senate"),
    ("rds", "Received in Senate"),
    ("rfh", "Referred in House"),
    ("rfs", "Referred in Senate"),
    ("rh", "Reported in House"),
    ("rhuc", "Returned to the House by Unanimous Consent"),
    ("rih", "Referral Instructions House"),
    ("rs", "Reported to Senate"),
    ("rth", "Referred to Committee House"),
    ("rts", "Referred to Committee Senate"),
    ("sc", "Sponsor Change"),
    ("statpvt", "Statutes at Large (Private Law)"),
    ("stat", "Statute"),
];

/// Human-readable label for a version code, case-insensitive.
pub fn bill_version_label(code: &str) -> Option<&'static str> {
    let code = code.trim();
    BILL_VERSION_CODES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, label)| *label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        assert_eq!(bill_version_label("ih"), Some("Introduced in House"));
        assert_eq!(bill_version_label("ENR"), Some("Enrolled Bill"));
        assert_eq!(bill_version_label("stat"), Some("Statute"));
    }

    #[test]
    fn unknown_code() {
        assert_eq!(bill_version_label("zz"), None);
    }
}
