use narwhal_linalg::Vector;

#[test]
fn arithmetic_operators_work_component_wise() {
    let a = Vector::new(vec![1.0, 2.0, 3.0]);
    let b = Vector::new(vec![4.0, -1.0, 0.5]);

    assert_eq!((&a + &b).as_slice(), &[5.0, 1.0, 3.5]);
    assert_eq!((&a - &b).as_slice(), &[-3.0, 3.0, 2.5]);
    assert_eq!((2.0 * &a).as_slice(), &[2.0, 4.0, 6.0]);
    assert_eq!((-&b).as_slice(), &[-4.0, 1.0, -0.5]);
    assert_eq!(a.comp_product(&b).as_slice(), &[4.0, -2.0, 1.5]);
    assert!((a.dot(&b) - 3.5).abs() < 1e-12);
}

#[test]
fn in_place_updates_do_not_change_the_length() {
    let mut a = Vector::new(vec![1.0, 1.0]);
    a += &Vector::new(vec![1.0, 2.0]);
    a -= &Vector::new(vec![0.5, 0.5]);
    a.add_scaled(2.0, &Vector::new(vec![1.0, 0.0]));
    assert_eq!(a.as_slice(), &[3.5, 2.5]);
}

#[test]
fn norm_of_a_three_four_vector_is_five() {
    let v: Vector = [3.0, 4.0].into_iter().collect();
    assert!((v.norm() - 5.0).abs() < 1e-12);
}

#[test]
#[should_panic(expected = "vector lengths differ")]
fn adding_vectors_of_different_lengths_panics() {
    let _ = &Vector::zeros(2) + &Vector::zeros(3);
}
