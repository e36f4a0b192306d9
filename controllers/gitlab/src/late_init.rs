//! Late initialization and drift comparison helpers.
//!
//! Late initialization fills a spec field only when it is unset and the
//! observed value is non-zero; a user-set value is never replaced. Drift
//! comparison treats an unset spec field as "don't care".

/// Copy `observed` into an unset field
pub fn late_init<T: Clone>(field: &mut Option<T>, observed: Option<&T>) -> bool {
    match (field.as_ref(), observed) {
        (None, Some(value)) => {
            *field = Some(value.clone());
            true
        }
        _ => false,
    }
}

/// Copy a non-empty observed string into an unset field
pub fn late_init_string(field: &mut Option<String>, observed: Option<&str>) -> bool {
    late_init(
        field,
        observed.filter(|s| !s.is_empty()).map(str::to_string).as_ref(),
    )
}

/// Copy an observed `true` into an unset field
pub fn late_init_bool(field: &mut Option<bool>, observed: bool) -> bool {
    late_init(field, observed.then_some(&true))
}

/// Copy a non-zero observed integer into an unset field
pub fn late_init_i64(field: &mut Option<i64>, observed: i64) -> bool {
    late_init(field, (observed != 0).then_some(&observed))
}

/// Copy a non-empty observed list into an unset field
pub fn late_init_list<T: Clone>(field: &mut Option<Vec<T>>, observed: &[T]) -> bool {
    if observed.is_empty() {
        return false;
    }
    late_init(field, Some(&observed.to_vec()))
}

/// Desired scalar matches, or is unset
pub fn matches<T: PartialEq>(desired: &Option<T>, observed: &T) -> bool {
    desired.as_ref().is_none_or(|d| d == observed)
}

/// Desired scalar matches an optional observation, or is unset
pub fn matches_opt<T: PartialEq>(desired: &Option<T>, observed: &Option<T>) -> bool {
    desired.is_none() || desired.as_ref() == observed.as_ref()
}

/// Desired string matches an optional observed string, or is unset
pub fn matches_str(desired: &Option<String>, observed: Option<&str>) -> bool {
    desired.as_deref().is_none_or(|d| Some(d) == observed)
}

/// Desired list is element-wise equal to the observed one, or is unset
pub fn matches_list<T: PartialEq>(desired: &Option<Vec<T>>, observed: &[T]) -> bool {
    desired.as_deref().is_none_or(|d| d == observed)
}

/// Count a set of late-init results; `true` when anything changed
pub fn any(changes: &[bool]) -> bool {
    changes.iter().any(|c| *c)
}
