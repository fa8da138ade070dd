extern crate easy_sens;

#[cfg(feature = "serde")]
mod serde_tests {
    use easy_sens::codegen::CodeGeneratorOptions;
    use easy_sens::matrices::DMatrix;
    use easy_sens::sparsity::Sparsity;

    #[test]
    fn test_sparsity_round_trip() {
        let pattern = Sparsity::from_triplets(3, 2, &[(0, 0), (2, 0), (1, 1)]).unwrap();
        let encoded = toml::to_string(&pattern).unwrap();
        println!("{}", encoded);
        assert!(encoded.contains("column_starts"));
        let decoded: Sparsity = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded, pattern);
    }

    #[test]
    fn test_options_defaults_fill_missing_fields() {
        let options: CodeGeneratorOptions = toml::from_str("prefix = \"model_\"").unwrap();
        assert_eq!(options.prefix, "model_");
        assert_eq!(options.real_t, "double");
        assert!(options.cpp_guards);
        assert_eq!(options.include, None);
    }

    #[test]
    fn test_malformed_sparsity_is_rejected() {
        let out_of_range = "rows = 2\ncolumns = 1\ncolumn_starts = [0, 5]\nrow_indices = [7]";
        assert!(toml::from_str::<Sparsity>(out_of_range).is_err());
        let unsorted = "rows = 3\ncolumns = 1\ncolumn_starts = [0, 2]\nrow_indices = [2, 1]";
        assert!(toml::from_str::<Sparsity>(unsorted).is_err());
        let missing_column = "rows = 2\ncolumns = 2\ncolumn_starts = [0, 1]\nrow_indices = [0]";
        assert!(toml::from_str::<Sparsity>(missing_column).is_err());
    }

    const SCALAR_PATTERN: &str =
        "[sparsity]\nrows = 1\ncolumns = 1\ncolumn_starts = [0, 1]\nrow_indices = [0]";

    #[test]
    fn test_matrix_values_must_match_pattern() {
        let matrix: DMatrix = toml::from_str(&format!("data = [1.5]\n{}", SCALAR_PATTERN)).unwrap();
        assert_eq!(matrix, DMatrix::scalar(1.5));
        let too_many = format!("data = [1.0, 2.0, 3.0]\n{}", SCALAR_PATTERN);
        assert!(toml::from_str::<DMatrix>(&too_many).is_err());
    }
}
