extern crate easy_sens;

#[cfg(test)]
mod tests {
    use easy_sens::codegen::{CodeGenerator, CodeGeneratorOptions};
    use easy_sens::graph::{MX, MXFunction};
    use easy_sens::numeric::extra::Sin;
    use easy_sens::scalar::{SXElem, SXFunction, SXMatrix};
    use easy_sens::sparsity::Sparsity;

    fn squares() -> SXFunction {
        let x = MX::sym("x", Sparsity::dense(2, 1));
        MXFunction::new(vec![x.clone()], vec![x.sq()])
            .unwrap()
            .expand()
            .unwrap()
    }

    #[test]
    fn test_generated_routine() {
        let mut generator = CodeGenerator::new(CodeGeneratorOptions::default());
        generator.add_function(&squares(), "squares");
        let source = generator.generate();
        println!("{}", source);
        assert!(source.starts_with("/* This file was automatically generated by easy-sens */"));
        assert!(source.contains("extern \"C\" {"));
        assert!(source.contains("#define d double"));
        assert!(source.contains("d aux_sq(d x) { return x*x;}"));
        assert!(source.contains("static const int s0[] = {2, 1, 0, 2, 0, 1};"));
        assert!(source.contains("int squares(const d** arg, d** res) {"));
        assert!(source.contains("  w[0] = arg[0] ? arg[0][0] : 0;"));
        assert!(source.contains("  w[2] = sq(w[0]);"));
        assert!(source.contains("    res[0][1] = w[3];"));
        assert!(source.contains("int squares_n_in(void) { return 1; }"));
        assert!(source.contains("const int* squares_sparsity_out(int i) {"));
        // both patterns are the same dense vector
        assert!(!source.contains("s1[]"));
    }

    #[test]
    fn test_shared_constants_and_includes() {
        let x = MX::sym("x", Sparsity::scalar());
        let scaled = MXFunction::new(vec![x.clone()], vec![&x * MX::scalar(0.25)])
            .unwrap()
            .expand()
            .unwrap();
        let waves = MXFunction::new(vec![x.clone()], vec![x.sin() * MX::scalar(0.25)])
            .unwrap()
            .expand()
            .unwrap();
        let options = CodeGeneratorOptions {
            prefix: "model_".to_string(),
            include: Some("model.h".to_string()),
            cpp_guards: false,
            ..CodeGeneratorOptions::default()
        };
        let mut generator = CodeGenerator::new(options);
        assert_eq!(generator.options().prefix, "model_");
        generator.add_function(&scaled, "scaled");
        generator.add_function(&waves, "waves");
        let source = generator.generate();
        assert!(!source.contains("__cplusplus"));
        assert!(source.contains("#include \"model.h\""));
        assert_eq!(source.matches("#include <math.h>").count(), 1);
        assert!(source.contains("static const d c0[] = {2.5000000000000000e-01};"));
        assert!(!source.contains("c1[]"));
        assert!(source.contains("int model_scaled(const d** arg, d** res) {"));
        assert!(source.contains("int model_waves_n_out(void) { return 1; }"));
        assert!(source.contains("sin(w[0])"));
    }

    #[test]
    fn test_write_to_file() {
        let mut generator = CodeGenerator::new(CodeGeneratorOptions::default());
        generator.add_function(&squares(), "squares");
        let path = std::env::temp_dir().join("easy_sens_codegen_test.c");
        generator.write_to(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, generator.generate());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_equal_values_share_a_constant() {
        let x = SXMatrix::sym("x", Sparsity::dense(2, 1));
        let scaled: Vec<SXElem> = x
            .elements()
            .iter()
            .map(|element| element.clone() * SXElem::constant(0.3))
            .collect();
        let y = SXMatrix::new(Sparsity::dense(2, 1), scaled).unwrap();
        let f = SXFunction::new(vec![x], vec![y]).unwrap();
        let mut generator = CodeGenerator::new(CodeGeneratorOptions::default());
        generator.add_function(&f, "scaled");
        let source = generator.generate();
        assert!(source.contains("static const d c0[] = {2.9999999999999999e-01};"));
        assert!(source.contains("  w[2] = c0[0];"));
        assert!(source.contains("  w[4] = c0[0];"));
    }
}
