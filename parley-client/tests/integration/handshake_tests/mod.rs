mod test_answer_handling;
