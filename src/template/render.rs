// src/template/render.rs

use super::Substitution;

/// Replace every literal occurrence of each placeholder with its value.
///
/// The text is scanned once, left to right. At each position the first
/// substitution (in list order) whose placeholder matches is applied and the
/// scan continues after the match, so inserted values are never searched
/// again and a later placeholder cannot match text produced by an earlier
/// one.
pub fn render(template: &str, substitutions: &[Substitution]) -> String {
    let active: Vec<&Substitution> = substitutions
        .iter()
        .filter(|s| !s.placeholder.is_empty())
        .collect();

    if active.is_empty() {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while !rest.is_empty() {
        // Earliest match position; ties go to the earlier substitution.
        let next = active
            .iter()
            .filter_map(|s| rest.find(s.placeholder.as_str()).map(|pos| (pos, *s)))
            .min_by_key(|(pos, _)| *pos);

        match next {
            Some((pos, sub)) => {
                out.push_str(&rest[..pos]);
                out.push_str(&sub.value);
                rest = &rest[pos + sub.placeholder.len()..];
            }
            None => {
                out.push_str(rest);
                break;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subs() -> Vec<Substitution> {
        vec![
            Substitution::new("127.0.0.1:80", "10.0.0.4:80"),
            Substitution::new("127.0.0.1:443", "10.0.0.4:443"),
        ]
    }

    #[test]
    fn replaces_every_occurrence() {
        let template = "HiddenServicePort 80 127.0.0.1:80\n\
                        HiddenServicePort 443 127.0.0.1:443\n\
                        HiddenServicePort 8080 127.0.0.1:80\n";
        let out = render(template, &subs());
        assert_eq!(
            out,
            "HiddenServicePort 80 10.0.0.4:80\n\
             HiddenServicePort 443 10.0.0.4:443\n\
             HiddenServicePort 8080 10.0.0.4:80\n"
        );
    }

    #[test]
    fn inserted_values_are_not_rescanned() {
        let subs = vec![
            Substitution::new("A", "B"),
            Substitution::new("B", "C"),
        ];
        assert_eq!(render("AB", &subs), "BC");
    }

    #[test]
    fn placeholder_is_matched_literally_not_as_regex() {
        let subs = vec![Substitution::new("1.2.3.4", "x")];
        assert_eq!(render("1x2x3x4 1.2.3.4", &subs), "1x2x3x4 x");
    }

    #[test]
    fn earlier_substitution_wins_at_same_position() {
        let subs = vec![
            Substitution::new("127.0.0.1:4", "first"),
            Substitution::new("127.0.0.1:443", "second"),
        ];
        assert_eq!(render("127.0.0.1:443", &subs), "first43");
    }

    #[test]
    fn no_substitutions_returns_template_unchanged() {
        assert_eq!(render("SocksPort 0\n", &[]), "SocksPort 0\n");
    }
}
