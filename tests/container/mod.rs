mod hash_function_tests;
