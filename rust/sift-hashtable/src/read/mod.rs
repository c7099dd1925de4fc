pub mod hashtable_reader;
