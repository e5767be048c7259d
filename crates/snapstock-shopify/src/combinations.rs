//! Cartesian expansion of variant options into value combinations.

use snapstock_core::VariantOption;

/// Expands an ordered option list into the ordered list of all value tuples.
///
/// Standard odometer order: the first option is the outermost loop, the last
/// option varies fastest. Deterministic and total — zero options produce an
/// empty result, and an option with zero values collapses the whole product
/// to empty. Iterative, so deep option lists cannot overflow the stack.
///
/// Downstream contract: the combination at index 0 represents the default
/// variant the platform auto-creates on product creation; the publish
/// protocol explicitly creates only combinations at index ≥ 1.
#[must_use]
pub fn expand(options: &[VariantOption]) -> Vec<Vec<String>> {
    if options.is_empty() {
        return Vec::new();
    }
    let sizes: Vec<usize> = options.iter().map(|o| o.values.len()).collect();
    if sizes.contains(&0) {
        return Vec::new();
    }

    let total: usize = sizes.iter().product();
    let mut result = Vec::with_capacity(total);
    let mut indices = vec![0usize; options.len()];

    'outer: loop {
        result.push(
            indices
                .iter()
                .zip(options)
                .map(|(&value_idx, option)| option.values[value_idx].clone())
                .collect(),
        );

        // Increment from the rightmost position, carrying leftwards.
        let mut pos = options.len();
        while pos > 0 {
            pos -= 1;
            indices[pos] += 1;
            if indices[pos] < sizes[pos] {
                continue 'outer;
            }
            indices[pos] = 0;
        }
        break;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(name: &str, values: &[&str]) -> VariantOption {
        VariantOption {
            name: name.to_string(),
            values: values.iter().map(ToString::to_string).collect(),
            quantities: None,
        }
    }

    #[test]
    fn two_options_expand_in_odometer_order() {
        let combos = expand(&[option("L", &["A", "B"]), option("R", &["X", "Y"])]);
        assert_eq!(
            combos,
            vec![
                vec!["A", "X"],
                vec!["A", "Y"],
                vec!["B", "X"],
                vec!["B", "Y"],
            ]
        );
    }

    #[test]
    fn single_option_yields_singleton_tuples() {
        let combos = expand(&[option("Size", &["S", "M", "L"])]);
        assert_eq!(combos, vec![vec!["S"], vec!["M"], vec!["L"]]);
    }

    #[test]
    fn zero_options_yield_empty() {
        assert!(expand(&[]).is_empty());
    }

    #[test]
    fn option_with_no_values_collapses_to_empty() {
        let combos = expand(&[option("Size", &["S"]), option("Color", &[])]);
        assert!(combos.is_empty());
    }

    #[test]
    fn single_valued_options_do_not_branch() {
        let combos = expand(&[option("Size", &["One Size"]), option("Color", &["Red", "Blue"])]);
        assert_eq!(combos, vec![vec!["One Size", "Red"], vec!["One Size", "Blue"]]);
    }

    #[test]
    fn output_length_is_product_of_cardinalities() {
        let combos = expand(&[
            option("A", &["1", "2", "3"]),
            option("B", &["x", "y"]),
            option("C", &["p", "q", "r", "s"]),
        ]);
        assert_eq!(combos.len(), 3 * 2 * 4);
        // First combination pairs every option's first value.
        assert_eq!(combos[0], vec!["1", "x", "p"]);
        // Last option varies fastest.
        assert_eq!(combos[1], vec!["1", "x", "q"]);
    }

    #[test]
    fn handles_hundreds_of_combinations() {
        let values: Vec<String> = (0..20).map(|i| format!("v{i}")).collect();
        let value_refs: Vec<&str> = values.iter().map(String::as_str).collect();
        let combos = expand(&[
            option("A", &value_refs),
            option("B", &value_refs[..10]),
        ]);
        assert_eq!(combos.len(), 200);
    }
}
