use shuttle_search::binary_main;

binary_main!(algo::Sieve);
